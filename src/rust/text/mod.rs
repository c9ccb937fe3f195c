//! Text normalization applied to article text before classification.

mod lemmatizer;
mod normalizer;
mod stopwords;

pub use lemmatizer::{Lemmatizer, Lexicon, LexiconError, PartOfSpeech, WORDNET_FILES};
pub use normalizer::TextNormalizer;
pub use stopwords::{is_stopword, ENGLISH_STOPWORDS};
