use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::model_manager::ModelManager;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Name of the label output emitted by exported classification pipelines.
pub const LABEL_OUTPUT: &str = "label";
/// Name of the optional class probability output.
pub const PROBABILITIES_OUTPUT: &str = "probabilities";

/// One prediction for one input string.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: i64,
    /// Per-class probabilities in label order, when the pipeline exposes them.
    pub probabilities: Option<Vec<f32>>,
}

impl Prediction {
    pub fn label(label: i64) -> Self {
        Self {
            label,
            probabilities: None,
        }
    }
}

/// A loaded pipeline that maps a batch of texts to one prediction each.
pub trait Predictor: Send + Sync {
    fn predict(&self, batch: &[String]) -> Result<Vec<Prediction>, ClassifierError>;
}

/// Produces a [`Predictor`] on demand. Called lazily by the classifier and
/// memoized on success.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Predictor>, ClassifierError>;

    /// Human readable location of the artifact, for logs and `info()`.
    fn source(&self) -> String;
}

/// A vectorizer + classifier pipeline exported to ONNX.
///
/// The graph takes a string tensor of shape `[N, 1]` and returns an int64
/// `label` tensor of shape `[N]`. A float `probabilities` tensor of shape
/// `[N, classes]` is read when present.
pub struct OnnxPipeline {
    session: Session,
    input_name: String,
    model_path: PathBuf,
}

impl fmt::Debug for OnnxPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxPipeline")
            .field("input_name", &self.input_name)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl OnnxPipeline {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                error!("Failed to load pipeline from {:?}: {}", path, e);
                ClassifierError::ModelError(format!("Failed to load pipeline: {}", e))
            })?;

        let input_name = Self::validate_model(&session)?;
        info!("Pipeline structure validated successfully (input '{}')", input_name);

        Ok(Self {
            session,
            input_name,
            model_path: path.to_path_buf(),
        })
    }

    /// Validates that the pipeline has one text input and a label output,
    /// returning the input name.
    fn validate_model(session: &Session) -> Result<String, ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ClassifierError::ModelError(format!(
                "Pipeline must have exactly 1 text input, found {}",
                inputs.len()
            )));
        }

        if !session.outputs.iter().any(|o| o.name == LABEL_OUTPUT) {
            return Err(ClassifierError::ModelError(format!(
                "Pipeline must have a '{}' output",
                LABEL_OUTPUT
            )));
        }

        Ok(inputs[0].name.clone())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Predictor for OnnxPipeline {
    fn predict(&self, batch: &[String]) -> Result<Vec<Prediction>, ClassifierError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let input_array = Array2::from_shape_vec((batch.len(), 1), batch.to_vec())
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to create input array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_string_array(input_array.view())
                .map_err(|e| ClassifierError::PredictionError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run pipeline: {}", e)))?;

        let labels: Vec<i64> = outputs
            .get(LABEL_OUTPUT)
            .ok_or_else(|| ClassifierError::PredictionError("Pipeline returned no labels".into()))?
            .try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract labels: {}", e)))?
            .iter()
            .copied()
            .collect();

        if labels.len() != batch.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Pipeline returned {} labels for {} inputs",
                labels.len(),
                batch.len()
            )));
        }

        // Pipelines exported with a zipmap emit a sequence of maps instead of
        // a tensor; those simply yield no probabilities.
        let probabilities: Option<Vec<Vec<f32>>> = outputs
            .get(PROBABILITIES_OUTPUT)
            .and_then(|value| value.try_extract_tensor::<f32>().ok())
            .filter(|tensor| tensor.ndim() == 2 && tensor.shape()[0] == batch.len())
            .map(|tensor| {
                tensor
                    .outer_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect()
            });

        Ok(labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Prediction {
                label,
                probabilities: probabilities.as_ref().map(|rows| rows[i].clone()),
            })
            .collect())
    }
}

/// Loads an [`OnnxPipeline`] from disk, optionally checking its SHA-256
/// first.
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    path: PathBuf,
    runtime_config: RuntimeConfig,
    expected_sha256: Option<String>,
}

impl OnnxModelLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            runtime_config: RuntimeConfig::default(),
            expected_sha256: None,
        }
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn with_sha256(mut self, hash: impl Into<String>) -> Self {
        self.expected_sha256 = Some(hash.into().to_ascii_lowercase());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn Predictor>, ClassifierError> {
        if !self.path.is_file() {
            let name = self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string());
            error!("Model file not found at {:?}", self.path);
            return Err(ClassifierError::ModelUnavailable(format!(
                "Model file '{}' not found. Please ensure the file is in the same directory.",
                name
            )));
        }

        if let Some(expected) = &self.expected_sha256 {
            let verified = ModelManager::verify_file(&self.path, expected)
                .map_err(|e| ClassifierError::ModelUnavailable(e.to_string()))?;
            if !verified {
                return Err(ClassifierError::ModelUnavailable(format!(
                    "Model file {:?} failed checksum verification",
                    self.path
                )));
            }
        }

        info!("Loading pipeline from {:?}", self.path);
        let pipeline = OnnxPipeline::from_file(&self.path, &self.runtime_config)?;
        Ok(Arc::new(pipeline))
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = OnnxModelLoader::new(dir.path().join("news.onnx"));
        match loader.load() {
            Err(ClassifierError::ModelUnavailable(msg)) => {
                assert!(msg.contains("'news.onnx' not found"));
            }
            other => panic!("expected ModelUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_checksum_mismatch_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.onnx");
        std::fs::write(&path, b"not a model").unwrap();
        let loader = OnnxModelLoader::new(&path).with_sha256("00".repeat(32));
        assert!(matches!(loader.load(), Err(ClassifierError::ModelUnavailable(_))));
    }

    #[test]
    fn test_source_is_path() {
        let loader = OnnxModelLoader::new("/opt/models/news.onnx");
        assert_eq!(loader.source(), "/opt/models/news.onnx");
        assert_eq!(loader.path(), Path::new("/opt/models/news.onnx"));
    }
}
