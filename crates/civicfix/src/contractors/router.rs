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

use super::domain::{ContractorRegistration, VerificationFilter};
use super::repository::ContractorRepository;
use super::service::{ContractorDirectory, DirectoryError};
use crate::error::{error_response, INTERNAL_ERROR_MESSAGE};

#[derive(Debug, Default, Deserialize)]
pub struct ListContractorsQuery {
    #[serde(default)]
    pub verified: Option<String>,
}

/// Router exposing contractor registration and listing at `/` and `/contractors`.
pub fn contractor_router<R>(directory: Arc<ContractorDirectory<R>>) -> Router
where
    R: ContractorRepository + 'static,
{
    Router::new()
        .route("/", get(list_handler::<R>).post(register_handler::<R>))
        .route("/contractors", get(list_handler::<R>).post(register_handler::<R>))
        .with_state(directory)
}

pub(crate) async fn register_handler<R>(
    State(directory): State<Arc<ContractorDirectory<R>>>,
    payload: Result<Json<ContractorRegistration>, JsonRejection>,
) -> Response
where
    R: ContractorRepository + 'static,
{
    let Json(registration) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match directory.register(registration).await {
        Ok(business_number) => {
            let payload = json!({
                "message": "Contractor added successfully",
                "business_number": business_number,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(DirectoryError::Invalid(invalid)) => {
            error_response(StatusCode::BAD_REQUEST, invalid.to_string())
        }
        Err(DirectoryError::AlreadyRegistered(business_number)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("business number {business_number} is already registered"),
        ),
        Err(other) => {
            error!(error = %other, "contractor registration failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

pub(crate) async fn list_handler<R>(
    State(directory): State<Arc<ContractorDirectory<R>>>,
    query: Result<Query<ListContractorsQuery>, QueryRejection>,
) -> Response
where
    R: ContractorRepository + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let filter = VerificationFilter::from_query(query.verified.as_deref());
    match directory.list(filter).await {
        Ok(contractors) => {
            (StatusCode::OK, Json(json!({ "contractors": contractors }))).into_response()
        }
        Err(err) => {
            error!(error = %err, ?filter, "contractor listing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}
