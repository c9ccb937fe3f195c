//! A news article classifier over a pre-trained ONNX text pipeline.
//!
//! Articles are normalized (lowercased, punctuation and stopwords removed,
//! lemmatized), passed to a vectorizer + classifier pipeline exported to
//! ONNX, and the integer label it returns is mapped to one of four
//! categories: World, Sports, Business, Science & Technology.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use gazette::{Article, NewsClassifier};
//!
//! let classifier = NewsClassifier::builder()
//!     .with_model_path("news.onnx")?
//!     .build()?;
//!
//! let article = Article::new("Stocks rallied after the central bank cut interest rates")
//!     .with_title("Markets cheer rate cut");
//! let result = classifier.classify(&article)?;
//! println!("Predicted category: {}", result.category_name());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier is `Send + Sync`. The pipeline is loaded on first use and
//! shared read-only afterwards, so one instance can serve many threads
//! behind an `Arc`.

pub mod classifier;
pub mod config;
pub mod model_manager;
mod runtime;
pub mod text;
pub mod web;

pub use classifier::{
    Article, ArticlePreview, Category, Classification, ClassifierBuilder, ClassifierError, ClassifierInfo,
    InputMode, ModelLoader, NewsClassifier, OnnxModelLoader, Prediction, Predictor,
};
pub use config::{ConfigError, Settings};
pub use model_manager::{ModelError, ModelManager};
pub use runtime::{create_session_builder, parse_optimization_level, RuntimeConfig};
pub use text::{Lexicon, TextNormalizer};

pub fn init_logger() {
    env_logger::init();
}
