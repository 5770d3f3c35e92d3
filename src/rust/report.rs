//! Screening reports rendered from a finished prediction.
//!
//! Rendering only consumes the verdict, confidence and timestamp as plain data,
//! so layout changes here never affect how a verdict is decided.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::classifier::{Prediction, Threshold, Verdict};

pub const REPORT_TITLE: &str = "Bone Fracture Detection Report";

const CLINICAL_NOTES: [&str; 3] = [
    "This result is generated using a deep learning model.",
    "The system analyzes X-ray images for fracture patterns.",
    "This is NOT a medical diagnosis.",
];

const DISCLAIMER: &str = "Disclaimer: This AI-based assessment is for educational and \
screening purposes only. Consult a certified medical professional.";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Unknown report format '{0}' (expected text or json)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// The data a report is rendered from.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub verdict: Verdict,
    /// Percentage, confidence in `verdict`
    pub confidence: f32,
    pub score: f32,
    pub threshold: Option<Threshold>,
    pub generated_at: DateTime<Local>,
    pub notes: Vec<String>,
    pub disclaimer: String,
}

impl Report {
    /// Creates a report for `prediction`, stamped with the current local time
    pub fn new(prediction: &Prediction) -> Self {
        Self::at(prediction, Local::now())
    }

    /// Creates a report with an explicit timestamp
    pub fn at(prediction: &Prediction, generated_at: DateTime<Local>) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            verdict: prediction.verdict,
            confidence: prediction.confidence,
            score: prediction.score,
            threshold: None,
            generated_at,
            notes: CLINICAL_NOTES.iter().map(|n| n.to_string()).collect(),
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// Records the threshold the verdict was decided with
    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Renders the human-readable document
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self, format: ReportFormat) -> Result<Vec<u8>, ReportError> {
        match format {
            ReportFormat::Text => Ok(self.to_text().into_bytes()),
            ReportFormat::Json => Ok(self.to_json()?.into_bytes()),
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>, format: ReportFormat) -> Result<(), ReportError> {
        let path = path.as_ref();
        let bytes = self.render(format)?;
        fs::write(path, bytes).map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f)?;
        writeln!(f, "Patient Summary")?;
        writeln!(f, "  Prediction Result: {}", self.verdict)?;
        writeln!(f, "  Confidence Score: {:.2}%", self.confidence)?;
        if let Some(threshold) = self.threshold {
            writeln!(f, "  Decision Threshold: {}", threshold)?;
        }
        writeln!(f, "  Report Generated: {}", self.generated_at.format("%d %B %Y, %H:%M"))?;
        writeln!(f)?;
        writeln!(f, "Clinical Notes")?;
        for note in &self.notes {
            writeln!(f, "  - {}", note)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.disclaimer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::classifier::decide;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap()
    }

    #[test]
    fn test_text_report_contents() {
        let prediction = decide(0.82, Threshold::default()).unwrap();
        let text = Report::at(&prediction, fixed_time()).to_text();

        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Prediction Result: Fractured"));
        assert!(text.contains("Confidence Score: 82.00%"));
        assert!(text.contains("Report Generated: 14 March 2026, 09:05"));
        assert!(text.contains("This is NOT a medical diagnosis."));
        assert!(!text.contains("Decision Threshold"));
    }

    #[test]
    fn test_text_report_layout() {
        let prediction = decide(0.10, Threshold::default()).unwrap();
        let report = Report::at(&prediction, fixed_time()).with_threshold(Threshold::default());
        let text = report.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(lines[1], "=".repeat(REPORT_TITLE.len()));
        assert_eq!(lines[3], "Patient Summary");
        assert_eq!(lines[4], "  Prediction Result: Normal");
        assert_eq!(lines[5], "  Confidence Score: 90.00%");
        assert_eq!(lines[6], "  Decision Threshold: 0.5");
        assert_eq!(text, report.to_string());
        assert!(text.ends_with("Consult a certified medical professional.\n"));
    }

    #[test]
    fn test_json_report() {
        let prediction = decide(0.10, Threshold::default()).unwrap();
        let report = Report::at(&prediction, fixed_time()).with_threshold(Threshold::default());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["verdict"], "Normal");
        assert!((value["confidence"].as_f64().unwrap() - 90.0).abs() < 1e-3);
        assert!((value["threshold"].as_f64().unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(value["notes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let prediction = decide(0.5, Threshold::default()).unwrap();

        Report::new(&prediction).write_to(&path, ReportFormat::Text).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Confidence Score: 50.00%"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("TEXT".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!(matches!("pdf".parse::<ReportFormat>(), Err(ReportError::UnknownFormat(_))));
    }
}
