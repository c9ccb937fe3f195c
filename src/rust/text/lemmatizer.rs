use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Lexicon file {0:?} contains no entries")]
    Empty(PathBuf),
}

/// Parts of speech the normalizer lemmatizes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Verb,
    Adverb,
}

impl PartOfSpeech {
    /// Suffix substitutions tried when a word is not an exception.
    fn substitutions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            Self::Adverb => &[],
        }
    }

    fn index_file(self) -> &'static str {
        match self {
            Self::Verb => "index.verb",
            Self::Adverb => "index.adv",
        }
    }

    fn exception_file(self) -> &'static str {
        match self {
            Self::Verb => "verb.exc",
            Self::Adverb => "adv.exc",
        }
    }
}

/// Names of the dict files a lexicon is read from.
pub const WORDNET_FILES: [&str; 4] = ["index.verb", "verb.exc", "index.adv", "adv.exc"];

const BUILTIN_VERB_INDEX: &str = include_str!("lexicon/index.verb");
const BUILTIN_VERB_EXCEPTIONS: &str = include_str!("lexicon/verb.exc");
const BUILTIN_ADVERB_INDEX: &str = include_str!("lexicon/index.adv");
const BUILTIN_ADVERB_EXCEPTIONS: &str = include_str!("lexicon/adv.exc");

#[derive(Debug, Default, Clone)]
struct PosTable {
    lemmas: HashSet<String>,
    exceptions: HashMap<String, Vec<String>>,
}

impl PosTable {
    /// Parses an `index.*` and a `*.exc` file body.
    fn parse<'a>(index: impl IntoIterator<Item = &'a str>, exceptions: impl IntoIterator<Item = &'a str>) -> Self {
        let lemmas = index
            .into_iter()
            // License header lines are indented.
            .filter(|line| !line.starts_with(' '))
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();

        let mut table: HashMap<String, Vec<String>> = HashMap::new();
        for line in exceptions {
            let mut fields = line.split_whitespace();
            if let Some(inflected) = fields.next() {
                let bases: Vec<String> = fields.map(str::to_string).collect();
                if !bases.is_empty() {
                    table.entry(inflected.to_string()).or_default().extend(bases);
                }
            }
        }

        Self {
            lemmas,
            exceptions: table,
        }
    }
}

/// Lemma index and exception lists for the parts of speech we lemmatize.
///
/// A lexicon is either loaded from a WordNet dictionary directory
/// (`index.verb`, `index.adv`, `verb.exc`, `adv.exc`) or built in. The
/// built-in lexicon is a subset of WordNet in the same format covering
/// common verbs and every adverb exception; words outside it are left as
/// they are.
#[derive(Debug, Clone)]
pub struct Lexicon {
    verb: PosTable,
    adverb: PosTable,
    wordnet: bool,
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            verb: PosTable::parse(BUILTIN_VERB_INDEX.lines(), BUILTIN_VERB_EXCEPTIONS.lines()),
            adverb: PosTable::parse(BUILTIN_ADVERB_INDEX.lines(), BUILTIN_ADVERB_EXCEPTIONS.lines()),
            wordnet: false,
        }
    }

    /// Loads the lexicon from a WordNet `dict` directory.
    pub fn from_wordnet_dir<P: AsRef<Path>>(dir: P) -> Result<Self, LexiconError> {
        let dir = dir.as_ref();
        info!("Loading WordNet lexicon from {:?}", dir);
        let verb = Self::load_table(dir, PartOfSpeech::Verb)?;
        let adverb = Self::load_table(dir, PartOfSpeech::Adverb)?;
        info!(
            "Lexicon loaded: {} verb lemmas, {} adverb lemmas",
            verb.lemmas.len(),
            adverb.lemmas.len()
        );
        Ok(Self {
            verb,
            adverb,
            wordnet: true,
        })
    }

    /// Loads from `dir` when given, falling back to the built-in lexicon if
    /// the directory is missing or unreadable.
    pub fn load_or_builtin(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => match Self::from_wordnet_dir(dir) {
                Ok(lexicon) => lexicon,
                Err(e) => {
                    warn!("Falling back to built-in lexicon: {}", e);
                    Self::builtin()
                }
            },
            None => {
                debug!("No WordNet directory configured, using built-in lexicon");
                Self::builtin()
            }
        }
    }

    /// True when loaded from a full WordNet dictionary.
    pub fn is_wordnet(&self) -> bool {
        self.wordnet
    }

    fn table(&self, pos: PartOfSpeech) -> &PosTable {
        match pos {
            PartOfSpeech::Verb => &self.verb,
            PartOfSpeech::Adverb => &self.adverb,
        }
    }

    fn load_table(dir: &Path, pos: PartOfSpeech) -> Result<PosTable, LexiconError> {
        let index_path = dir.join(pos.index_file());
        let index = read_lines(&index_path)?;
        let exceptions = read_lines(&dir.join(pos.exception_file()))?;
        let table = PosTable::parse(index.iter().map(String::as_str), exceptions.iter().map(String::as_str));
        if table.lemmas.is_empty() {
            return Err(LexiconError::Empty(index_path));
        }
        Ok(table)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, LexiconError> {
    let io_err = |source| LexiconError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)
}

/// WordNet-style lemmatizer ("morphy").
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    lexicon: Arc<Lexicon>,
}

impl Lemmatizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Returns the shortest known lemma of `word` for `pos`, or the word
    /// itself when none is found.
    /// Ties go to the earliest candidate, so a word that is itself a lemma
    /// beats an exception base of the same length ("saw" stays "saw").
    pub fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        self.morphy(word, pos)
            .into_iter()
            .min_by_key(|lemma| lemma.len())
            .unwrap_or_else(|| word.to_string())
    }

    fn morphy(&self, word: &str, pos: PartOfSpeech) -> Vec<String> {
        let table = self.lexicon.table(pos);

        if let Some(bases) = table.exceptions.get(word) {
            let mut candidates = vec![word.to_string()];
            candidates.extend(bases.iter().cloned());
            return Self::known(table, candidates);
        }

        let mut forms = Self::apply_rules(pos, &[word.to_string()]);
        let mut candidates = vec![word.to_string()];
        candidates.extend(forms.iter().cloned());
        let found = Self::known(table, candidates);
        if !found.is_empty() {
            return found;
        }

        // Rules only ever shorten a form, so this terminates.
        while !forms.is_empty() {
            forms = Self::apply_rules(pos, &forms);
            let found = Self::known(table, forms.clone());
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn apply_rules(pos: PartOfSpeech, forms: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for form in forms {
            for (suffix, replacement) in pos.substitutions() {
                if let Some(stem) = form.strip_suffix(suffix) {
                    let candidate = format!("{}{}", stem, replacement);
                    if seen.insert(candidate.clone()) {
                        out.push(candidate);
                    }
                }
            }
        }
        out
    }

    fn known(table: &PosTable, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|c| table.lemmas.contains(c) && seen.insert(c.clone()))
            .collect()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dict(dir: &Path) {
        fs::write(
            dir.join("index.verb"),
            "  1 This software and database is being provided\n\
             bank v 8 2 @ ~ 8 2 02787772 02787955\n\
             cut v 41 4 @ ~ * + 41 23 01552519 00429060\n\
             rally v 1 1 @ 1 0 00000002\n\
             bus v 1 1 @ 1 0 00000003\n\
             run v 1 1 @ 1 0 00000004\n\
             be v 1 1 @ 1 0 00000005\n\
             sing v 1 1 @ 1 0 00000006\n\
             singe v 1 1 @ 1 0 00000007\n\
             rate v 2 3 @ ~ + 2 1 00670261 00654625\n\
             saw v 1 3 @ ~ + 1 0 01258302\n\
             see v 24 4 @ ~ * + 24 23 02129289 02106506\n\
             stock v 11 3 @ ~ + 11 2 02210119 02208903\n",
        )
        .unwrap();
        fs::write(dir.join("verb.exc"), "ran run\nrallied rally\nsaw see\nwas be\n").unwrap();
        fs::write(
            dir.join("index.adv"),
            "  1 This software and database is being provided\n\
             well r 1 1 \\ 1 0 00000010\n\
             quickly r 1 1 \\ 1 0 00000011\n",
        )
        .unwrap();
        fs::write(dir.join("adv.exc"), "better well\n").unwrap();
    }

    fn indexed_lemmatizer() -> Lemmatizer {
        let dir = tempfile::tempdir().unwrap();
        write_dict(dir.path());
        let lexicon = Lexicon::from_wordnet_dir(dir.path()).unwrap();
        Lemmatizer::new(Arc::new(lexicon))
    }

    #[test]
    fn test_verb_suffix_rules() {
        let lemmatizer = indexed_lemmatizer();
        assert_eq!(lemmatizer.lemmatize("rallied", PartOfSpeech::Verb), "rally");
        assert_eq!(lemmatizer.lemmatize("rallies", PartOfSpeech::Verb), "rally");
        assert_eq!(lemmatizer.lemmatize("cuts", PartOfSpeech::Verb), "cut");
        assert_eq!(lemmatizer.lemmatize("busses", PartOfSpeech::Verb), "bus");
    }

    #[test]
    fn test_shortest_candidate_wins() {
        let lemmatizer = indexed_lemmatizer();
        // "singing" yields both "singe" and "sing"
        assert_eq!(lemmatizer.lemmatize("singing", PartOfSpeech::Verb), "sing");
    }

    #[test]
    fn test_exceptions_and_unknown_words() {
        let lemmatizer = indexed_lemmatizer();
        assert_eq!(lemmatizer.lemmatize("ran", PartOfSpeech::Verb), "run");
        assert_eq!(lemmatizer.lemmatize("was", PartOfSpeech::Verb), "be");
        assert_eq!(lemmatizer.lemmatize("stocks", PartOfSpeech::Verb), "stock");
        assert_eq!(lemmatizer.lemmatize("markets", PartOfSpeech::Verb), "markets");
        assert_eq!(lemmatizer.lemmatize("better", PartOfSpeech::Adverb), "well");
        assert_eq!(lemmatizer.lemmatize("quickly", PartOfSpeech::Adverb), "quickly");
        assert_eq!(lemmatizer.lemmatize("interest", PartOfSpeech::Adverb), "interest");
    }

    #[test]
    fn test_builtin_lexicon_applies_rules() {
        let lemmatizer = Lemmatizer::default();
        assert!(!lemmatizer.lexicon().is_wordnet());
        assert_eq!(lemmatizer.lemmatize("went", PartOfSpeech::Verb), "go");
        assert_eq!(lemmatizer.lemmatize("led", PartOfSpeech::Verb), "lead");
        assert_eq!(lemmatizer.lemmatize("rallied", PartOfSpeech::Verb), "rally");
        assert_eq!(lemmatizer.lemmatize("stocks", PartOfSpeech::Verb), "stock");
        assert_eq!(lemmatizer.lemmatize("rates", PartOfSpeech::Verb), "rate");
        assert_eq!(lemmatizer.lemmatize("stopped", PartOfSpeech::Verb), "stop");
        assert_eq!(lemmatizer.lemmatize("further", PartOfSpeech::Adverb), "far");
        assert_eq!(lemmatizer.lemmatize("interest", PartOfSpeech::Verb), "interest");
        assert_eq!(lemmatizer.lemmatize("gazette", PartOfSpeech::Verb), "gazette");
    }

    #[test]
    fn test_lemma_homographs_are_kept() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("saw", PartOfSpeech::Verb), "saw");
        assert_eq!(lemmatizer.lemmatize("felt", PartOfSpeech::Verb), "felt");
        assert_eq!(lemmatizer.lemmatize("fell", PartOfSpeech::Verb), "fell");
        assert_eq!(lemmatizer.lemmatize("best", PartOfSpeech::Adverb), "best");
        // Shorter exception bases still win
        assert_eq!(lemmatizer.lemmatize("found", PartOfSpeech::Verb), "find");
        assert_eq!(lemmatizer.lemmatize("better", PartOfSpeech::Adverb), "well");
    }

    #[test]
    fn test_builtin_matches_wordnet_dir_on_news_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        write_dict(dir.path());
        let wordnet = Lemmatizer::new(Arc::new(Lexicon::from_wordnet_dir(dir.path()).unwrap()));
        let builtin = Lemmatizer::default();
        assert!(wordnet.lexicon().is_wordnet());
        for word in ["stocks", "rallied", "rates", "cut", "bank", "saw"] {
            assert_eq!(
                builtin.lemmatize(word, PartOfSpeech::Verb),
                wordnet.lemmatize(word, PartOfSpeech::Verb),
                "{}",
                word
            );
        }
    }

    #[test]
    fn test_embedded_files_parse() {
        let lexicon = Lexicon::builtin();
        assert!(lexicon.verb.lemmas.contains("rally"));
        assert!(!lexicon.verb.lemmas.iter().any(|l| l.starts_with("Built")));
        assert_eq!(lexicon.adverb.exceptions["hardest"], vec!["hard".to_string()]);
    }

    #[test]
    fn test_missing_dir_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(Lexicon::from_wordnet_dir(&missing).is_err());
        let lexicon = Lexicon::load_or_builtin(Some(&missing));
        assert!(!lexicon.is_wordnet());
    }
}
