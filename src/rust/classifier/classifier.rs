use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info, warn};
use serde::Serialize;

use super::article::Article;
use super::category::Category;
use super::error::ClassifierError;
use super::model::{ModelLoader, Predictor};
use super::{ClassifierInfo, InputMode};
use crate::text::TextNormalizer;

/// The outcome of classifying one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Raw label returned by the pipeline
    pub label: i64,
    /// The category for the label, `None` when unclassified
    pub category: Option<Category>,
    /// Class probabilities when the pipeline exposes them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<Category, f32>>,
    /// The text that was fed to the pipeline
    pub input: String,
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }

    /// Category name, or "unclassified".
    pub fn category_name(&self) -> &'static str {
        self.category.map(Category::name).unwrap_or("unclassified")
    }
}

/// A news article classifier over a lazily loaded, memoized pipeline.
///
/// The pipeline is not touched until the first [`classify`](Self::classify)
/// with a non-empty description. A successful load is kept for the lifetime
/// of the classifier; a failed load is reported and retried on the next call.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use gazette::{Article, NewsClassifier};
///
/// let classifier = NewsClassifier::builder()
///     .with_model_path("news.onnx")?
///     .build()?;
///
/// let result = classifier.classify(&Article::new(
///     "Stocks rallied after the central bank cut interest rates",
/// ))?;
/// println!("Predicted category: {}", result.category_name());
/// # Ok(())
/// # }
/// ```
pub struct NewsClassifier {
    pub(super) loader: Box<dyn ModelLoader>,
    pub(super) model: Mutex<Option<Arc<dyn Predictor>>>,
    pub(super) normalizer: TextNormalizer,
    pub(super) input_mode: InputMode,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<NewsClassifier>();
    }
};

impl std::fmt::Debug for NewsClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClassifier")
            .field("model_source", &self.loader.source())
            .field("model_loaded", &self.is_model_loaded())
            .field("input_mode", &self.input_mode)
            .finish()
    }
}

impl NewsClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_source: self.loader.source(),
            model_loaded: self.is_model_loaded(),
            input_mode: self.input_mode,
            wordnet_lexicon: self.normalizer.lexicon().is_wordnet(),
        }
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the pipeline, loading it on first use.
    pub fn model(&self) -> Result<Arc<dyn Predictor>, ClassifierError> {
        let mut slot = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        info!("Loading model from {}", self.loader.source());
        let model = self.loader.load()?;
        *slot = Some(Arc::clone(&model));
        info!("Model loaded and cached");
        Ok(model)
    }

    /// Classifies an article by its description.
    ///
    /// # Errors
    /// - `ValidationError` if the description is empty; the model is not loaded
    /// - `ModelUnavailable` / `ModelError` if the pipeline cannot be loaded
    /// - `ModelError` also if loading panics
    /// - `PredictionError` if inference fails or panics
    ///
    /// A label outside the known categories is not an error; the returned
    /// classification has no category.
    pub fn classify(&self, article: &Article) -> Result<Classification, ClassifierError> {
        if !article.has_description() {
            return Err(ClassifierError::ValidationError(
                "Please enter the article description to classify.".into(),
            ));
        }

        let input = match self.input_mode {
            InputMode::Normalized => self.normalize(&article.description),
            InputMode::Raw => article.description.clone(),
        };
        debug!("Pipeline input ({:?}): {}", self.input_mode, input);

        // ort may panic during initialization.
        let model = panic::catch_unwind(AssertUnwindSafe(|| self.model()))
            .unwrap_or_else(|payload| Err(ClassifierError::ModelError(panic_message(payload))))
            .map_err(|e| {
                error!("Model load failed: {}", e);
                e
            })?;
        let batch = vec![input.clone()];
        let prediction = panic::catch_unwind(AssertUnwindSafe(|| model.predict(&batch)))
            .unwrap_or_else(|payload| Err(ClassifierError::PredictionError(panic_message(payload))))
            .map_err(|e| {
                error!("Classification failed: {}", e);
                e
            })?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::PredictionError("Pipeline returned no prediction".into()))?;

        let category = Category::from_label(prediction.label);
        // Columns are ordered by label, 1 through 4.
        let probabilities = prediction.probabilities.and_then(|scores| {
            if scores.len() != Category::ALL.len() {
                warn!(
                    "Ignoring {} probability columns, expected {}",
                    scores.len(),
                    Category::ALL.len()
                );
                return None;
            }
            Some(Category::ALL.iter().copied().zip(scores).collect::<BTreeMap<_, _>>())
        });

        let classification = Classification {
            label: prediction.label,
            category,
            probabilities,
            input,
        };
        info!(
            "Classified article as {} (label {})",
            classification.category_name(),
            classification.label
        );
        Ok(classification)
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "inference panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::Prediction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPredictor(i64);

    impl Predictor for FixedPredictor {
        fn predict(&self, batch: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
            Ok(batch.iter().map(|_| Prediction::label(self.0)).collect())
        }
    }

    struct CountingLoader {
        label: i64,
        loads: Arc<AtomicUsize>,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self) -> Result<Arc<dyn Predictor>, ClassifierError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FixedPredictor(self.label)))
        }

        fn source(&self) -> String {
            "memory".to_string()
        }
    }

    fn classifier(label: i64) -> (NewsClassifier, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let classifier = NewsClassifier::builder()
            .with_loader(CountingLoader {
                label,
                loads: Arc::clone(&loads),
            })
            .unwrap()
            .build()
            .unwrap();
        (classifier, loads)
    }

    #[test]
    fn test_model_is_memoized() {
        let (classifier, loads) = classifier(2);
        assert!(!classifier.is_model_loaded());
        for _ in 0..3 {
            classifier.classify(&Article::new("Team wins final")).unwrap();
        }
        assert!(classifier.is_model_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "inference panicked");
    }

    #[test]
    fn test_class_info() {
        let (classifier, _) = classifier(1);
        let info = classifier.info();
        assert_eq!(info.model_source, "memory");
        assert!(!info.model_loaded);
        assert_eq!(info.input_mode, InputMode::Normalized);
    }
}
