/// Error types for the results service
///
/// Data-access failures propagate to the caller; the HTTP layer turns them
/// into JSON error bodies.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use s3_utils::ObjectStoreError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ObjectStoreError> for ServiceError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound { bucket, key } => {
                ServiceError::ObjectNotFound { bucket, key }
            }
            ObjectStoreError::Unavailable(msg) => ServiceError::StorageUnavailable(msg),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::QueryError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(format!("query task failed: {err}"))
    }
}

/// JSON error body returned by the HTTP API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ServiceError {
    fn error_type(&self) -> &'static str {
        match self {
            ServiceError::ObjectNotFound { .. } => "object_not_found",
            ServiceError::StorageUnavailable(_) => "storage_unavailable",
            ServiceError::QueryError(_) => "query_error",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Io(_) | ServiceError::Internal(_) => "server_error",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ObjectNotFound { .. } | ServiceError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::QueryError(_) | ServiceError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Io(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        })
    }
}
