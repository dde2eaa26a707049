use std::sync::Arc;

use tracing::{error, info};

use super::classifier::{ClassifierError, ImageClassifier};
use super::domain::{ClassificationRequest, ClassificationResult, ImageUpload};

const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Validates uploads and delegates labeling to the configured classifier.
pub struct ImageScanner<C> {
    classifier: Arc<C>,
}

impl<C> ImageScanner<C>
where
    C: ImageClassifier + 'static,
{
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    pub async fn scan(&self, upload: ImageUpload) -> Result<ClassificationResult, ScanError> {
        let ImageUpload {
            bytes,
            filename,
            content_type,
        } = upload;

        let filename = filename.trim().to_string();
        if filename.is_empty() {
            return Err(ScanError::MissingFilename);
        }
        if bytes.is_empty() {
            return Err(ScanError::EmptyImage);
        }

        let mime_type = resolve_mime_type(content_type.as_deref(), &filename);
        let request = ClassificationRequest {
            image: bytes,
            filename,
            mime_type,
        };

        match self.classifier.classify(&request).await {
            Ok(mut result) => {
                result.filename = request.filename;
                info!(
                    filename = %result.filename,
                    label = %result.label,
                    confidence = result.confidence,
                    "image scanned"
                );
                Ok(result)
            }
            Err(err) => {
                error!(filename = %request.filename, error = %err, "image classification failed");
                Err(ScanError::Upstream(err))
            }
        }
    }
}

/// Caller-declared type first, then a guess from the extension, then JPEG.
pub fn resolve_mime_type(declared: Option<&str>, filename: &str) -> String {
    if let Some(declared) = declared.map(str::trim) {
        if !declared.is_empty() && declared != "application/octet-stream" {
            return declared.to_string();
        }
    }

    mime_guess::from_path(filename)
        .first()
        .filter(|guess| guess.type_() == mime_guess::mime::IMAGE)
        .map(|guess| guess.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Error raised by the scan gateway.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No image file provided")]
    MissingImage,
    #[error("No selected file")]
    MissingFilename,
    #[error("image file is empty")]
    EmptyImage,
    #[error(transparent)]
    Upstream(#[from] ClassifierError),
}

impl ScanError {
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, ScanError::Upstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_content_type_wins() {
        assert_eq!(resolve_mime_type(Some("image/png"), "photo.jpg"), "image/png");
    }

    #[test]
    fn guesses_from_extension_when_undeclared() {
        assert_eq!(resolve_mime_type(None, "street.webp"), "image/webp");
        assert_eq!(
            resolve_mime_type(Some("application/octet-stream"), "lamp.png"),
            "image/png"
        );
    }

    #[test]
    fn falls_back_to_jpeg() {
        assert_eq!(resolve_mime_type(None, "upload"), "image/jpeg");
        assert_eq!(resolve_mime_type(Some(""), "notes.txt"), "image/jpeg");
    }
}
