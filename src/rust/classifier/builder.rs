use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{info, warn};

use super::classifier::NewsClassifier;
use super::error::ClassifierError;
use super::model::{ModelLoader, OnnxModelLoader};
use super::InputMode;
use crate::runtime::RuntimeConfig;
use crate::text::{Lexicon, TextNormalizer};

/// A builder for constructing a [`NewsClassifier`] with a fluent interface.
///
/// Building never loads the pipeline; that happens on the first
/// classification.
#[derive(Default)]
pub struct ClassifierBuilder {
    model_path: Option<PathBuf>,
    model_sha256: Option<String>,
    loader: Option<Box<dyn ModelLoader>>,
    lexicon: Option<Arc<Lexicon>>,
    wordnet_dir: Option<PathBuf>,
    input_mode: InputMode,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use gazette::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the path of the ONNX pipeline artifact.
    ///
    /// The file does not need to exist yet; a missing artifact is reported
    /// when the first classification is attempted.
    ///
    /// # Errors
    /// - `BuildError` if the path is empty
    /// - `BuildError` if a model source was already set
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Result<Self, ClassifierError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model path cannot be empty".to_string()));
        }
        self.ensure_no_model_source()?;
        self.model_path = Some(path);
        Ok(self)
    }

    /// Requires the artifact to match the given SHA-256 hex digest before it
    /// is loaded. Only applies to [`with_model_path`](Self::with_model_path).
    pub fn with_model_sha256(mut self, hash: impl Into<String>) -> Self {
        self.model_sha256 = Some(hash.into());
        self
    }

    /// Uses a custom model loader instead of an ONNX file.
    pub fn with_loader<L: ModelLoader + 'static>(mut self, loader: L) -> Result<Self, ClassifierError> {
        self.ensure_no_model_source()?;
        self.loader = Some(Box::new(loader));
        Ok(self)
    }

    /// Loads the lemmatizer lexicon from a WordNet `dict` directory.
    pub fn with_wordnet_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.wordnet_dir = Some(dir.into());
        self
    }

    /// Uses an already loaded lexicon. Takes precedence over
    /// [`with_wordnet_dir`](Self::with_wordnet_dir).
    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Selects whether normalized or raw description text is fed to the
    /// pipeline.
    pub fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }

    fn ensure_no_model_source(&self) -> Result<(), ClassifierError> {
        if self.model_path.is_some() || self.loader.is_some() {
            return Err(ClassifierError::BuildError("Model source already set".to_string()));
        }
        Ok(())
    }

    /// Builds and returns the final NewsClassifier instance
    ///
    /// # Errors
    /// - `BuildError` if no model path or loader was set
    pub fn build(self) -> Result<NewsClassifier, ClassifierError> {
        let loader: Box<dyn ModelLoader> = match (self.loader, self.model_path) {
            (Some(loader), _) => loader,
            (None, Some(path)) => {
                let mut loader = OnnxModelLoader::new(path).with_runtime_config(self.runtime_config);
                if let Some(hash) = self.model_sha256 {
                    loader = loader.with_sha256(hash);
                }
                Box::new(loader)
            }
            (None, None) => {
                return Err(ClassifierError::BuildError(
                    "A model path or loader must be set".to_string(),
                ))
            }
        };

        let lexicon = match self.lexicon {
            Some(lexicon) => lexicon,
            None => Arc::new(Lexicon::load_or_builtin(self.wordnet_dir.as_deref())),
        };

        if self.input_mode == InputMode::Normalized && !lexicon.is_wordnet() {
            warn!(
                "Normalizing with the built-in lexicon; words outside it are not lemmatized. \
                 Set GAZETTE_WORDNET or run `gazette fetch-wordnet` for full WordNet lemmas"
            );
        }

        info!(
            "Classifier ready (model: {}, input mode: {:?}, WordNet lexicon: {})",
            loader.source(),
            self.input_mode,
            lexicon.is_wordnet()
        );

        Ok(NewsClassifier {
            loader,
            model: Mutex::new(None),
            normalizer: TextNormalizer::new(lexicon),
            input_mode: self.input_mode,
        })
    }
}
