//! Associations between verified contractors and civic reports.
//!
//! A link is only ever created for a contractor that exists and is verified;
//! the store performs that check and the insert as one atomic step.

pub mod domain;
pub mod ledger;
pub mod repository;
pub mod router;


pub use domain::{LinkOutcome, ReportId, ReportListing, ServiceRequestSubmission};
pub use ledger::{LedgerError, ServiceRequestLedger};
pub use repository::ServiceRequestRepository;
pub use router::service_request_router;
