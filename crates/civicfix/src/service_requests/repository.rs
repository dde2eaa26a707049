use async_trait::async_trait;

use super::domain::{LinkOutcome, ReportId};
use crate::contractors::BusinessNumber;
use crate::store::RepositoryError;

/// Storage abstraction for contractor/report associations.
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// Insert the association only if the contractor exists and is verified.
    /// The existence check, verification check, and insert must be atomic.
    async fn link_if_verified(
        &self,
        business_number: &BusinessNumber,
        report_id: &ReportId,
    ) -> Result<LinkOutcome, RepositoryError>;

    /// Report ids linked to the business, oldest link first.
    async fn report_ids(
        &self,
        business_number: &BusinessNumber,
    ) -> Result<Vec<ReportId>, RepositoryError>;
}
