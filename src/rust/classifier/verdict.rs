use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Discrete outcome of a screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Fractured,
    Normal,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fractured => f.write_str("Fractured"),
            Self::Normal => f.write_str("Normal"),
        }
    }
}

/// Decision boundary on the raw model score.
///
/// Always strictly between 0 and 1. The default is `0.5`; one earlier revision
/// of the screening tool used `0.4`, so the value is kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f32);

impl Threshold {
    pub const DEFAULT: f32 = 0.5;

    /// Creates a threshold, rejecting values outside the open interval (0, 1).
    ///
    /// # Example
    /// ```
    /// use fracture_scan::Threshold;
    ///
    /// assert!(Threshold::new(0.4).is_ok());
    /// assert!(Threshold::new(1.0).is_err());
    /// ```
    pub fn new(value: f32) -> Result<Self, ClassifierError> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(ClassifierError::ValidationError(format!(
                "Threshold must be strictly between 0 and 1, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of one classification. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub verdict: Verdict,
    /// Confidence in the reported verdict, as a percentage in [0, 100].
    pub confidence: f32,
    /// Raw model output the verdict was derived from.
    pub score: f32,
}

/// Maps a raw score onto a verdict and the confidence in that verdict.
///
/// `score >= threshold` is `Fractured` with confidence `score * 100`; anything
/// below is `Normal` with confidence `(1 - score) * 100`.
///
/// # Errors
/// - `InferenceError` if the score is NaN or outside [0, 1]. Scores are never clamped.
///
/// # Example
/// ```
/// use fracture_scan::{decide, Threshold, Verdict};
///
/// let prediction = decide(0.10, Threshold::default())?;
/// assert_eq!(prediction.verdict, Verdict::Normal);
/// assert!((prediction.confidence - 90.0).abs() < 1e-3);
/// # Ok::<(), fracture_scan::ClassifierError>(())
/// ```
pub fn decide(score: f32, threshold: Threshold) -> Result<Prediction, ClassifierError> {
    if !(0.0..=1.0).contains(&score) {
        return Err(ClassifierError::InferenceError(format!(
            "Model score {} is outside [0, 1]; check that the model ends in a sigmoid output",
            score
        )));
    }

    let (verdict, confidence) = if score >= threshold.value() {
        (Verdict::Fractured, score * 100.0)
    } else {
        (Verdict::Normal, (1.0 - score) * 100.0)
    };

    Ok(Prediction { verdict, confidence, score })
}
