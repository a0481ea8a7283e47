use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("X has {got} features, but the scaler is expecting {expected} features as input")]
    DimensionMismatch { got: usize, expected: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClusterError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClusterError::BadRequest(_) | ClusterError::DimensionMismatch { .. }
        )
    }
}

impl IntoResponse for ClusterError {
    fn into_response(self) -> Response {
        let (status, error_message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.to_string())
        } else {
            tracing::error!("Internal server error: {}", self);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<JsonRejection> for ClusterError {
    fn from(rejection: JsonRejection) -> Self {
        ClusterError::BadRequest(rejection.body_text())
    }
}
