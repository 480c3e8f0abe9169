//! Handler errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{0}")]
    Conflict(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::NOT_FOUND => tracing::warn!(error = %self, "Request failed"),
            _ => tracing::error!(error = %self, "Request failed"),
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
