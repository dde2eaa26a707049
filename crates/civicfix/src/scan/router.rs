use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::classifier::ImageClassifier;
use super::domain::ImageUpload;
use super::service::{ImageScanner, ScanError};

const IMAGE_FIELD: &str = "image";

/// Router exposing `POST /scan` for multipart image uploads.
pub fn scan_router<C>(scanner: Arc<ImageScanner<C>>, max_upload_bytes: usize) -> Router
where
    C: ImageClassifier + 'static,
{
    Router::new()
        .route("/scan", post(scan_handler::<C>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(scanner)
}

pub(crate) async fn scan_handler<C>(
    State(scanner): State<Arc<ImageScanner<C>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    C: ImageClassifier + 'static,
{
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return failure(rejection.status(), rejection.body_text()),
    };

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return failure(err.status(), err.body_text()),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return failure(err.status(), err.body_text()),
        };
        upload = Some(ImageUpload {
            bytes: bytes.to_vec(),
            filename,
            content_type,
        });
        break;
    }

    let result = match upload {
        Some(upload) => scanner.scan(upload).await,
        None => Err(ScanError::MissingImage),
    };

    match result {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({ "success": true, "result": result })),
        )
            .into_response(),
        Err(err) if err.is_invalid_input() => failure(StatusCode::BAD_REQUEST, err.to_string()),
        Err(_) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "image classification failed".to_string(),
        ),
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}
