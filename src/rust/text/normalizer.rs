use std::sync::Arc;

use tokenizers::NormalizedString;

use super::lemmatizer::{Lemmatizer, Lexicon, PartOfSpeech};
use super::stopwords::is_stopword;

/// Maps raw article text to the normalized token string the pipeline was
/// trained on.
///
/// Normalization lowercases, strips ASCII punctuation, drops stopwords and
/// lemmatizes every remaining word as a verb, then drops stopwords again and
/// lemmatizes as an adverb. The result is joined with single spaces.
///
/// # Example
/// ```
/// use gazette::TextNormalizer;
///
/// let normalizer = TextNormalizer::default();
/// assert_eq!(normalizer.normalize("The markets WENT up!"), "market go");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lemmatizer: Lemmatizer::new(lexicon),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        self.lemmatizer.lexicon()
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = NormalizedString::from(text);
        normalized.lowercase();
        normalized.filter(|c| !c.is_ascii_punctuation());

        let verbs: Vec<String> = normalized
            .get()
            .split_whitespace()
            .filter(|word| !is_stopword(word))
            .map(|word| self.lemmatizer.lemmatize(word, PartOfSpeech::Verb))
            .collect();

        verbs
            .iter()
            .filter(|word| !is_stopword(word))
            .map(|word| self.lemmatizer.lemmatize(word, PartOfSpeech::Adverb))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_input() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   \t\n"), "");
    }

    #[test]
    fn test_only_punctuation_and_stopwords() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("The, and... of!? -- it's"), "");
    }

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let normalizer = TextNormalizer::default();
        assert_eq!(
            normalizer.normalize("Stocks rallied after the Central-Bank cut rates."),
            "stock rally centralbank cut rate"
        );
    }

    #[test]
    fn test_stopwords_checked_after_punctuation_removal() {
        let normalizer = TextNormalizer::default();
        // "don't" loses its apostrophe before the stopword check
        assert_eq!(normalizer.normalize("Don't panic"), "dont panic");
    }

    #[test]
    fn test_verb_then_adverb_lemmas() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("Team went farther"), "team go far");
    }

    #[test]
    fn test_news_headline() {
        let normalizer = TextNormalizer::default();
        assert_eq!(
            normalizer.normalize("Stocks rallied after the central bank cut interest rates"),
            "stock rally central bank cut interest rate"
        );
    }

    #[test]
    fn test_words_that_are_lemmas_stay() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("saw best felt"), "saw best felt");
    }

    #[test]
    fn test_with_wordnet_dict() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.verb"),
            "  1 This software and database is being provided\n\
             bank v 8 2 @ ~ 8 2 02787772 02787955\n\
             cut v 41 4 @ ~ * + 41 23 01552519 00429060\n\
             rally v 6 3 @ ~ + 6 1 01961974 02063771\n\
             rate v 2 3 @ ~ + 2 1 00670261 00654625\n\
             stock v 11 3 @ ~ + 11 2 02210119 02208903\n",
        )
        .unwrap();
        fs::write(dir.path().join("verb.exc"), "rallied rally\n").unwrap();
        fs::write(dir.path().join("index.adv"), "well r 13 2 \\ + 13 7 00011093 00012129\n").unwrap();
        fs::write(dir.path().join("adv.exc"), "better well\n").unwrap();

        let lexicon = Lexicon::from_wordnet_dir(dir.path()).unwrap();
        let normalizer = TextNormalizer::new(Arc::new(lexicon));
        assert!(normalizer.lexicon().is_wordnet());
        assert_eq!(
            normalizer.normalize("Stocks rallied after the central bank cut interest rates"),
            "stock rally central bank cut interest rate"
        );
    }

    #[test]
    fn test_deterministic() {
        let normalizer = TextNormalizer::default();
        let text = "Scientists found ancient water on Mars, NASA said.";
        let first = normalizer.normalize(text);
        for _ in 0..5 {
            assert_eq!(normalizer.normalize(text), first);
        }
    }
}
