use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{LinkOutcome, ReportId, ReportListing, ServiceRequestSubmission};
use super::repository::ServiceRequestRepository;
use crate::contractors::BusinessNumber;
use crate::store::RepositoryError;

/// Ledger linking verified contractors to civic reports.
pub struct ServiceRequestLedger<R> {
    repository: Arc<R>,
}

impl<R> ServiceRequestLedger<R>
where
    R: ServiceRequestRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Link a report to a contractor. Only verified contractors may be linked.
    pub async fn link_report(
        &self,
        submission: ServiceRequestSubmission,
    ) -> Result<(BusinessNumber, ReportId), LedgerError> {
        let business_number = non_blank(&submission.business_number)
            .map(BusinessNumber)
            .ok_or(LedgerError::MissingField("business_number"))?;
        let report_id = non_blank(&submission.report_id)
            .map(ReportId)
            .ok_or(LedgerError::MissingField("report_id"))?;

        match self
            .repository
            .link_if_verified(&business_number, &report_id)
            .await?
        {
            LinkOutcome::Created => {
                info!(%business_number, %report_id, "service request linked");
                Ok((business_number, report_id))
            }
            LinkOutcome::BusinessNotFound => {
                warn!(%business_number, %report_id, "link rejected: business not found");
                Err(LedgerError::BusinessNotFound(business_number))
            }
            LinkOutcome::Unverified => {
                warn!(%business_number, %report_id, "link rejected: business not verified");
                Err(LedgerError::Unverified(business_number))
            }
        }
    }

    /// Reports linked to `business_number`. Unknown businesses yield an empty
    /// listing rather than an error.
    pub async fn list_report_ids(
        &self,
        business_number: Option<&str>,
    ) -> Result<ReportListing, LedgerError> {
        let business_number = business_number
            .and_then(non_blank)
            .map(BusinessNumber)
            .ok_or(LedgerError::MissingField("business_number"))?;

        let report_ids = self.repository.report_ids(&business_number).await?;
        Ok(ReportListing::new(business_number, report_ids))
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Error raised by the service request ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} parameter required")]
    MissingField(&'static str),
    #[error("business {0} not found")]
    BusinessNotFound(BusinessNumber),
    #[error("unauthorized: business {0} not verified")]
    Unverified(BusinessNumber),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
