//! Bone fracture screening for X-ray images using a binary ONNX classifier.
//!
//! An uploaded image is resized to 224x224, scaled to `[0, 1]` and scored by the
//! model. The score is mapped to a [`Verdict`] and a confidence percentage that
//! always refers to the reported verdict.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use fracture_scan::Classifier;
//!
//! let classifier = Classifier::builder()
//!     .with_model_file("models/bone_fracture.onnx")?
//!     .with_threshold(0.5)?
//!     .build()?;
//!
//! let prediction = classifier.classify_file("xray.png")?;
//! println!("{} ({:.2}%)", prediction.verdict, prediction.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Injecting a Model
//!
//! The decision logic only depends on the [`ScoreModel`] capability, so any
//! scorer can be passed in directly:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use fracture_scan::{classify, ImageBatch, ScoreError, Threshold, Verdict};
//! use image::DynamicImage;
//!
//! let model = |_: &ImageBatch| -> Result<Vec<f32>, ScoreError> { Ok(vec![0.5]) };
//! let prediction = classify(&DynamicImage::new_rgb8(100, 100), &model, Threshold::default())?;
//! assert_eq!(prediction.verdict, Verdict::Fractured);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod model_manager;
pub mod report;

pub use classifier::{
    classify, classify_bytes, classify_with_filter, decide, decode_image, preprocess, Classifier,
    ClassifierBuilder, ClassifierError, ClassifierInfo, ImageBatch, OnnxModel, Prediction,
    ResizeFilter, ScoreError, ScoreModel, Threshold, Verdict,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError, ModelInfo};
pub use report::{Report, ReportError, ReportFormat};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init_logger() {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
    {
        log::debug!("Logger already initialized: {}", e);
    }
}
