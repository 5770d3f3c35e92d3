mod error;
mod model;
mod preprocess;
mod verdict;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;

pub use error::ClassifierError;
pub use model::{OnnxModel, ScoreError, ScoreModel};
pub use preprocess::{decode_image, preprocess, ImageBatch, ResizeFilter, INPUT_SIZE, MAX_IMAGE_BYTES, RGB_CHANNELS};
pub use verdict::{decide, Prediction, Threshold, Verdict};
pub use classifier::{classify, classify_bytes, classify_with_filter, Classifier};
pub use builder::ClassifierBuilder;

/// Information about the configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if the model was loaded from disk
    pub model_path: Option<String>,
    /// Decision threshold on the raw score
    pub threshold: Threshold,
    /// Interpolation used when resizing to the model input size
    pub resize_filter: ResizeFilter,
}
