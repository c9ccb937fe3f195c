use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while classifying an article.
#[derive(Debug)]
pub enum ClassifierError {
    /// The model artifact could not be located or opened
    ModelUnavailable(String),
    /// Error occurred while loading or validating the ONNX pipeline
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input
    ValidationError(String),
}

impl ClassifierError {
    /// True for errors caused by the submitted article rather than the model.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}
