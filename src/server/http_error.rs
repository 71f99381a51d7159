//! HTTP error handling for the site handlers.
//!
//! Handler failures become a status code plus a short plain-text body.
//! Internal details are logged, not sent to the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::query::QueryError;
use crate::storage::StorageError;

/// Error returned by request handlers.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource does not exist; the message is shown to the visitor
    #[error("{0}")]
    NotFound(String),

    /// Something failed while serving the request
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    /// Create a 404 with a visitor-facing message.
    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::NotFound(message.into())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            HttpError::Internal(details) => {
                error!("Request failed: {}", details);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<StorageError> for HttpError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => HttpError::NotFound(format!("Not found: {}", what)),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

impl From<QueryError> for HttpError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(_) => HttpError::NotFound("Abstract not found".to_string()),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = HttpError::not_found("Post not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = HttpError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_storage_error() {
        let err: HttpError = StorageError::NotFound("post 'x'".to_string()).into();
        assert!(matches!(err, HttpError::NotFound(_)));

        let err: HttpError = StorageError::SerializationError("bad".to_string()).into();
        assert!(matches!(err, HttpError::Internal(_)));
    }

    #[test]
    fn test_from_query_error() {
        let err: HttpError = QueryError::NotFound("1".to_string()).into();
        assert_eq!(err.to_string(), "Abstract not found");

        let err: HttpError = QueryError::EmptyQuery.into();
        assert!(matches!(err, HttpError::Internal(_)));
    }
}
