use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::credentials::{CredentialError, PasswordHasher};
use super::domain::{
    BusinessNumber, ContractorRegistration, ContractorSummary, NewContractor, RegistrationInvalid,
    VerificationFilter,
};
use super::repository::ContractorRepository;
use crate::store::RepositoryError;

/// Registration and listing facade over the contractor store.
pub struct ContractorDirectory<R> {
    repository: Arc<R>,
    hasher: PasswordHasher,
}

impl<R> ContractorDirectory<R>
where
    R: ContractorRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_hasher(repository, PasswordHasher::default())
    }

    pub fn with_hasher(repository: Arc<R>, hasher: PasswordHasher) -> Self {
        Self { repository, hasher }
    }

    /// Register a contractor. The record starts unverified and the password
    /// is stored only as a salted hash.
    pub async fn register(
        &self,
        registration: ContractorRegistration,
    ) -> Result<BusinessNumber, DirectoryError> {
        let ContractorRegistration {
            business_number,
            name,
            email,
            password,
            phone_number,
            company_website,
            description,
        } = registration;

        let business_number = required("business_number", business_number)?;
        let name = required("name", name)?;
        let email = required("email", email)?;
        if password.is_empty() {
            return Err(RegistrationInvalid::MissingField("password").into());
        }

        let password_hash = self.hasher.hash(&password)?;
        let business_number = BusinessNumber(business_number);

        let contractor = NewContractor {
            business_number: business_number.clone(),
            name,
            email,
            password_hash,
            phone_number: optional(phone_number),
            company_website: optional(company_website),
            description: optional(description),
            registered_at: Utc::now(),
        };

        match self.repository.insert(contractor).await {
            Ok(()) => {
                info!(%business_number, "contractor registered");
                Ok(business_number)
            }
            Err(RepositoryError::Conflict) => {
                warn!(%business_number, "duplicate contractor registration");
                Err(DirectoryError::AlreadyRegistered(business_number))
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn list(
        &self,
        filter: VerificationFilter,
    ) -> Result<Vec<ContractorSummary>, DirectoryError> {
        Ok(self.repository.list(filter).await?)
    }

    pub async fn set_verified(
        &self,
        business_number: &BusinessNumber,
        verified: bool,
    ) -> Result<(), DirectoryError> {
        self.repository
            .set_verified(business_number, verified)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => DirectoryError::NotFound(business_number.clone()),
                other => other.into(),
            })?;

        info!(%business_number, verified, "contractor verification updated");
        Ok(())
    }
}

fn required(field: &'static str, value: String) -> Result<String, RegistrationInvalid> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RegistrationInvalid::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Error raised by the contractor directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Invalid(#[from] RegistrationInvalid),
    #[error("business number {0} is already registered")]
    AlreadyRegistered(BusinessNumber),
    #[error("business {0} not found")]
    NotFound(BusinessNumber),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
