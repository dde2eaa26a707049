use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Business number identifying a contractor; primary key of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessNumber(pub String);

impl BusinessNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration payload accepted by `POST /contractors`.
///
/// Every field defaults so that missing keys surface as validation errors
/// rather than body rejections.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractorRegistration {
    #[serde(default)]
    pub business_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl fmt::Debug for ContractorRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractorRegistration")
            .field("business_number", &self.business_number)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .field("company_website", &self.company_website)
            .field("description", &self.description)
            .finish()
    }
}

/// Sanitized row handed to the repository; the credential is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContractor {
    pub business_number: BusinessNumber,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub company_website: Option<String>,
    pub description: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Public view of a contractor. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContractorSummary {
    pub company_bn: String,
    pub company_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub company_website: Option<String>,
    pub description: Option<String>,
    pub verified: bool,
    pub registered_at: DateTime<Utc>,
}

/// Listing filter for the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationFilter {
    #[default]
    All,
    VerifiedOnly,
}

impl VerificationFilter {
    /// Interpret the `verified` query flag: only a case-insensitive `true`
    /// narrows the listing.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("true") => Self::VerifiedOnly,
            _ => Self::All,
        }
    }
}

/// Missing or blank required registration input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationInvalid {
    #[error("{0} is required")]
    MissingField(&'static str),
}
