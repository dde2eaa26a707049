//! Civic-issue image classification through an external vision model.
//!
//! Uploads are validated here, sent to the model with a fixed category list
//! and an output schema, and the reply is accepted only if it matches that
//! schema exactly.

pub mod classifier;
pub mod domain;
pub mod gemini;
pub mod router;
pub mod service;


pub use classifier::{ClassifierError, ImageClassifier};
pub use domain::{
    ClassificationRequest, ClassificationResult, ImageUpload, IssueCategory, SchemaViolation,
};
pub use gemini::GeminiClassifier;
pub use router::scan_router;
pub use service::{resolve_mime_type, ImageScanner, ScanError};
