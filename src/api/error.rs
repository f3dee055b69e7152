//! HTTP rendering of domain errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::OverCommitted(_) => StatusCode::CONFLICT,
            DomainError::Configuration(_) | DomainError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DomainError::SyncTransport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
