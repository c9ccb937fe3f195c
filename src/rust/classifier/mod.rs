use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod article;
mod category;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod model;
pub mod builder;

pub use article::{Article, ArticlePreview, DEFAULT_PREVIEW_CHARS};
pub use builder::ClassifierBuilder;
pub use category::Category;
pub use classifier::{Classification, NewsClassifier};
pub use error::ClassifierError;
pub use model::{
    ModelLoader, OnnxModelLoader, OnnxPipeline, Prediction, Predictor, LABEL_OUTPUT,
    PROBABILITIES_OUTPUT,
};

/// Which text is fed to the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// The normalized description (lowercased, stopwords removed, lemmatized)
    #[default]
    Normalized,
    /// The description exactly as submitted
    Raw,
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normalized" => Ok(Self::Normalized),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown input mode '{}' (expected 'normalized' or 'raw')", other)),
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalized => f.write_str("normalized"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Where the pipeline is loaded from
    pub model_source: String,
    /// Whether the pipeline has been loaded yet
    pub model_loaded: bool,
    /// Which text is fed to the pipeline
    pub input_mode: InputMode,
    /// Whether the lemmatizer runs on a full WordNet dictionary
    pub wordnet_lexicon: bool,
}
