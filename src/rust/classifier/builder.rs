use std::path::Path;
use std::sync::Arc;

use log::info;

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::model::{OnnxModel, ScoreModel};
use super::preprocess::ResizeFilter;
use super::verdict::Threshold;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    model: Option<Arc<dyn ScoreModel>>,
    threshold: Threshold,
    resize_filter: ResizeFilter,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for ClassifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierBuilder")
            .field("model_path", &self.model_path)
            .field("model_loaded", &self.model.is_some())
            .field("threshold", &self.threshold)
            .field("resize_filter", &self.resize_filter)
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use fracture_scan::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when loading an ONNX model file.
    /// Must be called before [`with_model_file`](Self::with_model_file) to take effect.
    ///
    /// # Example
    /// ```
    /// use fracture_scan::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads an ONNX model from disk and uses it for scoring
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - A model is already set
    ///   - The file is missing or not a valid ONNX model
    ///
    /// # Example
    /// ```no_run
    /// use fracture_scan::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_model_file("models/bone_fracture.onnx");
    /// ```
    pub fn with_model_file(mut self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        if self.model.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }

        let model = OnnxModel::from_file(path, &self.runtime_config)?;
        info!("Model ready for scoring: {}", model.model_path);

        self.model_path = Some(model.model_path.clone());
        self.model = Some(Arc::new(model));
        Ok(self)
    }

    /// Uses an already constructed scoring model, replacing any previous one
    pub fn with_model<M: ScoreModel + 'static>(mut self, model: M) -> Self {
        self.model_path = None;
        self.model = Some(Arc::new(model));
        self
    }

    /// Uses a scoring model shared with other owners
    pub fn with_shared_model(mut self, model: Arc<dyn ScoreModel>) -> Self {
        self.model_path = None;
        self.model = Some(model);
        self
    }

    /// Sets the decision threshold (default 0.5)
    ///
    /// # Errors
    /// - `ValidationError` if the value is not strictly between 0 and 1
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self, ClassifierError> {
        self.threshold = Threshold::new(threshold)?;
        Ok(self)
    }

    /// Sets the interpolation used when resizing to the model input size
    pub fn with_resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Errors
    /// - `ModelUnavailable` if no model was loaded
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let model = self.model.ok_or_else(|| {
            ClassifierError::ModelUnavailable(
                "No model loaded; call with_model_file() or with_model() first".to_string(),
            )
        })?;

        info!(
            "Classifier built (threshold {}, resize filter {})",
            self.threshold, self.resize_filter
        );

        Ok(Classifier {
            model_path: self.model_path,
            model,
            threshold: self.threshold,
            resize_filter: self.resize_filter,
        })
    }
}
