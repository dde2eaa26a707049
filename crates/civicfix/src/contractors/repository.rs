use async_trait::async_trait;

use super::domain::{BusinessNumber, ContractorSummary, NewContractor, VerificationFilter};
use crate::store::RepositoryError;

/// Storage abstraction for contractor records.
#[async_trait]
pub trait ContractorRepository: Send + Sync {
    /// Insert a new, unverified contractor. Duplicate business numbers yield
    /// [`RepositoryError::Conflict`].
    async fn insert(&self, contractor: NewContractor) -> Result<(), RepositoryError>;

    /// List contractors in registration order.
    async fn list(
        &self,
        filter: VerificationFilter,
    ) -> Result<Vec<ContractorSummary>, RepositoryError>;

    /// Administrative toggle of the verification flag.
    async fn set_verified(
        &self,
        business_number: &BusinessNumber,
        verified: bool,
    ) -> Result<(), RepositoryError>;
}
