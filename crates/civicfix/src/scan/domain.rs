use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Closed set of civic-issue categories the model may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    #[serde(rename = "roads")]
    Roads,
    #[serde(rename = "lighting & signals")]
    LightingAndSignals,
    #[serde(rename = "snow & ice")]
    SnowAndIce,
    #[serde(rename = "waste & sanitation")]
    WasteAndSanitation,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Roads,
        IssueCategory::LightingAndSignals,
        IssueCategory::SnowAndIce,
        IssueCategory::WasteAndSanitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IssueCategory::Roads => "roads",
            IssueCategory::LightingAndSignals => "lighting & signals",
            IssueCategory::SnowAndIce => "snow & ice",
            IssueCategory::WasteAndSanitation => "waste & sanitation",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == label)
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured answer returned for one scanned image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub filename: String,
    pub label: IssueCategory,
    pub confidence: f64,
}

/// Image handed to the scanner by the API surface or the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// Validated request passed to an [`ImageClassifier`](super::ImageClassifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub image: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

/// Output that does not honor the classification contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("model output is not the expected JSON object: {0}")]
    Shape(String),
    #[error("label '{0}' is not one of the allowed categories")]
    UnknownLabel(String),
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClassification {
    filename: String,
    label: String,
    confidence: f64,
}

impl ClassificationResult {
    /// Parse the model's JSON text. Any deviation from the contract is an
    /// error; there is no best-effort recovery.
    pub fn from_model_output(text: &str) -> Result<Self, SchemaViolation> {
        let raw: RawClassification = serde_json::from_str(text.trim())
            .map_err(|err| SchemaViolation::Shape(err.to_string()))?;

        let label = IssueCategory::from_label(&raw.label)
            .ok_or_else(|| SchemaViolation::UnknownLabel(raw.label.clone()))?;

        if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
            return Err(SchemaViolation::ConfidenceOutOfRange(raw.confidence));
        }

        Ok(Self {
            filename: raw.filename,
            label,
            confidence: raw.confidence,
        })
    }
}

/// JSON schema constraining the model's output to the three contract fields.
pub fn response_schema() -> Value {
    let labels: Vec<&str> = IssueCategory::ALL.iter().map(|c| c.label()).collect();
    json!({
        "type": "object",
        "properties": {
            "filename": {
                "type": "string",
                "description": "Base name of the image file"
            },
            "label": {
                "type": "string",
                "enum": labels,
                "description": "One of the allowed categories"
            },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
        },
        "required": ["filename", "label", "confidence"],
        "propertyOrdering": ["filename", "label", "confidence"]
    })
}

pub fn classification_prompt(filename: &str) -> String {
    let labels: Vec<&str> = IssueCategory::ALL.iter().map(|c| c.label()).collect();
    format!(
        "Classify this image into exactly one of the categories: {}. \
         Return a short confidence in [0,1]. If unsure, choose the closest fit. \
         The image file is named \"{filename}\".",
        labels.join(", ")
    )
}
