//! Mapping of service errors onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sponsora_core::error::SponsoraError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] SponsoraError),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("missing x-actor-id header")]
    MissingActor,

    #[error("x-actor-id header is not a valid id")]
    InvalidActor,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(err) => {
                let status = match err {
                    SponsoraError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    SponsoraError::NotFound { .. } => StatusCode::NOT_FOUND,
                    SponsoraError::InvalidTransition { .. }
                    | SponsoraError::InvalidState { .. }
                    | SponsoraError::Conflict { .. } => StatusCode::CONFLICT,
                    SponsoraError::Database(_) | SponsoraError::Internal(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.kind())
            }
            ApiError::Json(rejection) => {
                let status = match rejection {
                    JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, "validation")
            }
            ApiError::Path(_) | ApiError::Query(_) => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::MissingActor | ApiError::InvalidActor => {
                (StatusCode::UNAUTHORIZED, "unauthenticated")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let payload = json!({
            "error": kind,
            "message": self.to_string(),
        });
        (status, Json(payload)).into_response()
    }
}
