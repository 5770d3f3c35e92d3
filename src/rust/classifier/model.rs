use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};
use ndarray::{CowArray, IxDyn};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::preprocess::ImageBatch;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Failure reported by a scoring model.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The model is not loaded or cannot be reached
    #[error("{0}")]
    Unavailable(String),
    /// The model ran but failed to produce scores
    #[error("{0}")]
    Failed(String),
}

/// The scoring capability the classifier depends on.
///
/// Implementors receive a single-item NHWC batch (`[1, 224, 224, 3]`, values in
/// `[0, 1]`) and return one score per batch item. A score is expected to be a
/// probability-like value in `[0, 1]`; anything else is rejected by the caller.
///
/// Closures with the matching signature implement this trait, which keeps tests
/// and alternative backends free of any model file:
///
/// ```
/// use fracture_scan::{ImageBatch, ScoreError, ScoreModel};
///
/// let always_normal = |_batch: &ImageBatch| -> Result<Vec<f32>, ScoreError> { Ok(vec![0.05]) };
/// let batch = ImageBatch::zeros((1, 224, 224, 3));
/// assert_eq!(always_normal.predict(&batch).unwrap(), vec![0.05]);
/// ```
pub trait ScoreModel: Send + Sync {
    fn predict(&self, batch: &ImageBatch) -> Result<Vec<f32>, ScoreError>;
}

impl<F> ScoreModel for F
where
    F: Fn(&ImageBatch) -> Result<Vec<f32>, ScoreError> + Send + Sync,
{
    fn predict(&self, batch: &ImageBatch) -> Result<Vec<f32>, ScoreError> {
        self(batch)
    }
}

/// A binary image classifier exported to ONNX, loaded once and reused.
///
/// The model must take a float tensor of shape `[batch, 224, 224, 3]` as its
/// first input and produce one sigmoid probability per batch item as its first
/// output (shape `[batch, 1]` or `[batch]`).
#[derive(Debug)]
pub struct OnnxModel {
    pub model_path: String,
    session: Arc<Session>,
    input_name: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxModel>();
    }
};

impl OnnxModel {
    /// Loads an ONNX model from disk.
    ///
    /// # Errors
    /// - `ModelLoadError` if the path is empty or does not exist
    /// - `ModelLoadError` if the file is not a readable ONNX graph
    /// - `ModelLoadError` if the graph has no inputs or no outputs
    pub fn from_file(path: impl AsRef<Path>, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ClassifierError::ModelLoadError("Model path cannot be empty".into()));
        }
        if !path.exists() {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                error!("Failed to load model {}: {}", path.display(), e);
                ClassifierError::ModelLoadError(format!("Failed to load model {}: {}", path.display(), e))
            })?;

        Self::validate_model(&session)?;
        let input_name = session.inputs[0].name.clone();
        info!("Model loaded from {} (input '{}')", path.display(), input_name);

        Ok(Self {
            model_path: path.to_string_lossy().to_string(),
            session: Arc::new(session),
            input_name,
        })
    }

    /// Validates that the model has at least one input and one output
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelLoadError(
                "Model must have at least 1 input for the image batch".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelLoadError(
                "Model must have at least 1 output for the fracture probability".to_string(),
            ));
        }
        Ok(())
    }
}

// Preprocessed batches are already row-major, so this borrows without copying
fn input_view(batch: &ImageBatch) -> CowArray<'_, f32, IxDyn> {
    batch.as_standard_layout().into_dyn()
}

impl ScoreModel for OnnxModel {
    fn predict(&self, batch: &ImageBatch) -> Result<Vec<f32>, ScoreError> {
        let input = input_view(batch);

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ScoreError::Failed(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ScoreError::Failed(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoreError::Failed(format!("Failed to extract output tensor: {}", e)))?;

        debug!("Model output shape: {:?}", output_tensor.shape());
        Ok(output_tensor.iter().copied().collect())
    }
}
