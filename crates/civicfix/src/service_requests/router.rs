use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::ServiceRequestSubmission;
use super::ledger::{LedgerError, ServiceRequestLedger};
use super::repository::ServiceRequestRepository;
use crate::error::{error_response, INTERNAL_ERROR_MESSAGE};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub business_number: Option<String>,
}

/// Router exposing the ledger at `/service` and `/services`.
pub fn service_request_router<R>(ledger: Arc<ServiceRequestLedger<R>>) -> Router
where
    R: ServiceRequestRepository + 'static,
{
    Router::new()
        .route("/service", get(report_ids_handler::<R>).post(link_handler::<R>))
        .route("/services", get(report_ids_handler::<R>).post(link_handler::<R>))
        .with_state(ledger)
}

pub(crate) async fn link_handler<R>(
    State(ledger): State<Arc<ServiceRequestLedger<R>>>,
    payload: Result<Json<ServiceRequestSubmission>, JsonRejection>,
) -> Response
where
    R: ServiceRequestRepository + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match ledger.link_report(submission).await {
        Ok((business_number, report_id)) => {
            let payload = json!({
                "message": "Service added successfully",
                "business_number": business_number,
                "report_id": report_id,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => ledger_error_response(err),
    }
}

pub(crate) async fn report_ids_handler<R>(
    State(ledger): State<Arc<ServiceRequestLedger<R>>>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response
where
    R: ServiceRequestRepository + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match ledger.list_report_ids(query.business_number.as_deref()).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => ledger_error_response(err),
    }
}

fn ledger_error_response(err: LedgerError) -> Response {
    match err {
        LedgerError::MissingField(_) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::BusinessNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Business not found")
        }
        LedgerError::Unverified(_) => {
            error_response(StatusCode::FORBIDDEN, "Unauthorized: Business not verified")
        }
        LedgerError::Repository(source) => {
            error!(error = %source, "service request store failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}
