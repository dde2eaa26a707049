use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contractors::BusinessNumber;

/// Identifier of an externally tracked civic report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub String);

impl ReportId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link request accepted by `POST /service`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceRequestSubmission {
    #[serde(default)]
    pub business_number: String,
    #[serde(default)]
    pub report_id: String,
}

/// Result of the gated insert performed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    BusinessNotFound,
    Unverified,
}

/// Reports linked to a business, in link order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportListing {
    pub business_number: BusinessNumber,
    pub report_ids: Vec<ReportId>,
    pub count: usize,
}

impl ReportListing {
    pub fn new(business_number: BusinessNumber, report_ids: Vec<ReportId>) -> Self {
        let count = report_ids.len();
        Self {
            business_number,
            report_ids,
            count,
        }
    }
}
