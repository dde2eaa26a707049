use async_trait::async_trait;

use super::domain::{ClassificationRequest, ClassificationResult, SchemaViolation};

/// External model able to label one image.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifierError>;
}

/// Failure talking to, or understanding, the external model.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier API key is not configured")]
    NotConfigured,
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier response had no candidate text")]
    EmptyResponse,
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

impl ClassifierError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Timeout | ClassifierError::Transport(_) => true,
            ClassifierError::Status { status, .. } => *status == 429 || *status >= 500,
            ClassifierError::NotConfigured
            | ClassifierError::EmptyResponse
            | ClassifierError::Schema(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value.to_string())
        }
    }
}
