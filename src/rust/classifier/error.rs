use ort::Error as OrtError;
use std::fmt;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while classifying an X-ray.
///
/// None of these are retried internally; every failure is surfaced to the caller
/// and no partial prediction is ever produced.
#[derive(Debug)]
pub enum ClassifierError {
    /// The input could not be decoded as an RGB image (re-upload required)
    InvalidImage(String),
    /// The scoring model is not loaded or not reachable
    ModelUnavailable(String),
    /// The model artifact is missing or could not be loaded
    ModelLoadError(String),
    /// The model failed or returned an output outside [0, 1]
    InferenceError(String),
    /// Error occurred due to invalid configuration parameters
    ValidationError(String),
    /// Error occurred during the build phase
    BuildError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            Self::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            Self::ModelLoadError(msg) => write!(f, "Model load error: {}", msg),
            Self::InferenceError(msg) => write!(f, "Inference error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelLoadError(err.to_string())
    }
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        ClassifierError::ModelLoadError(err.to_string())
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::InvalidImage(err.to_string())
    }
}
