use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use log::{error, info};

use super::error::ClassifierError;
use super::model::{ScoreError, ScoreModel};
use super::preprocess::{decode_image, preprocess, ResizeFilter};
use super::verdict::{decide, Prediction, Threshold};

/// Classifies one image with an injected scoring model.
///
/// The image is resized to 224x224 with the bicubic filter, scaled to `[0, 1]`,
/// scored as a single-item batch, and the score is mapped to a verdict with
/// [`decide`]. The call blocks for the duration of the model's forward pass.
///
/// # Errors
/// - `InvalidImage` if the image has no pixels
/// - `ModelUnavailable` if the model reports it is not loaded
/// - `InferenceError` if the model fails or its output is not exactly one score in [0, 1]
///
/// # Example
/// ```
/// use fracture_scan::{classify, ImageBatch, ScoreError, Threshold, Verdict};
/// use image::DynamicImage;
///
/// let model = |_: &ImageBatch| -> Result<Vec<f32>, ScoreError> { Ok(vec![0.82]) };
/// let prediction = classify(&DynamicImage::new_rgb8(512, 512), &model, Threshold::default())?;
/// assert_eq!(prediction.verdict, Verdict::Fractured);
/// assert_eq!(format!("{:.2}", prediction.confidence), "82.00");
/// # Ok::<(), fracture_scan::ClassifierError>(())
/// ```
pub fn classify<M>(image: &DynamicImage, model: &M, threshold: Threshold) -> Result<Prediction, ClassifierError>
where
    M: ScoreModel + ?Sized,
{
    classify_with_filter(image, model, threshold, ResizeFilter::default())
}

/// Decodes raw upload bytes and classifies them. See [`classify`].
///
/// # Errors
/// - `InvalidImage` if the bytes are not a decodable image
/// - Forwards all errors from [`classify`]
pub fn classify_bytes<M>(bytes: &[u8], model: &M, threshold: Threshold) -> Result<Prediction, ClassifierError>
where
    M: ScoreModel + ?Sized,
{
    let image = decode_image(bytes)?;
    classify(&image, model, threshold)
}

/// Same as [`classify`] with an explicit resize filter.
pub fn classify_with_filter<M>(
    image: &DynamicImage,
    model: &M,
    threshold: Threshold,
    filter: ResizeFilter,
) -> Result<Prediction, ClassifierError>
where
    M: ScoreModel + ?Sized,
{
    let batch = preprocess(image, filter)?;

    let scores = model.predict(&batch).map_err(|e| match e {
        ScoreError::Unavailable(msg) => ClassifierError::ModelUnavailable(msg),
        ScoreError::Failed(msg) => {
            error!("Model failed during inference: {}", msg);
            ClassifierError::InferenceError(msg)
        }
    })?;

    let score = match scores.as_slice() {
        [score] => *score,
        other => {
            error!("Expected exactly 1 score for a single-item batch, got {}", other.len());
            return Err(ClassifierError::InferenceError(format!(
                "Expected exactly 1 score for a single-item batch, got {}",
                other.len()
            )));
        }
    };

    let prediction = decide(score, threshold).map_err(|e| {
        error!("Rejected model output: {}", e);
        e
    })?;

    info!(
        "Score {:.4} against threshold {} -> {} ({:.2}%)",
        score, threshold, prediction.verdict, prediction.confidence
    );
    Ok(prediction)
}

/// A fracture classifier holding its model and configuration.
///
/// Build it once at startup and reuse it for every request; the model is
/// shared through an `Arc`, so the classifier can also be shared across threads.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fracture_scan::{Classifier, ImageBatch, ScoreError, Verdict};
/// use image::DynamicImage;
///
/// let classifier = Classifier::builder()
///     .with_model(|_: &ImageBatch| -> Result<Vec<f32>, ScoreError> { Ok(vec![0.10]) })
///     .with_threshold(0.5)?
///     .build()?;
///
/// let prediction = classifier.classify(&DynamicImage::new_rgb8(64, 64))?;
/// assert_eq!(prediction.verdict, Verdict::Normal);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Classifier {
    pub model_path: Option<String>,
    pub model: Arc<dyn ScoreModel>,
    pub threshold: Threshold,
    pub resize_filter: ResizeFilter,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("model_path", &self.model_path)
            .field("threshold", &self.threshold)
            .field("resize_filter", &self.resize_filter)
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's configuration
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            threshold: self.threshold,
            resize_filter: self.resize_filter,
        }
    }

    /// Classifies a decoded image
    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction, ClassifierError> {
        classify_with_filter(image, self.model.as_ref(), self.threshold, self.resize_filter)
    }

    /// Classifies raw upload bytes (PNG, JPEG, ...)
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        let image = decode_image(bytes)?;
        self.classify(&image)
    }

    /// Reads an image file and classifies it
    ///
    /// # Errors
    /// - `InvalidImage` if the file cannot be read or decoded
    pub fn classify_file(&self, path: impl AsRef<Path>) -> Result<Prediction, ClassifierError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ClassifierError::InvalidImage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        info!("Classifying {} ({} bytes)", path.display(), bytes.len());
        self.classify_bytes(&bytes)
    }
}
