use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use thiserror::Error;

use crate::core::helpers::error_page;

/// Failures reported by a [`Store`](crate::core::db::Store).
///
/// Only `Query` is recovered by the search layer. It covers filters the
/// server refuses to execute, such as an invalid pattern or an empty `$or`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("query execution failed: {0}")]
    Query(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to decode record: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_query_failure(&self) -> bool {
        matches!(self, StoreError::Query(_))
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Internal details stay in the logs, the page only names the status
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::NotFound(_) => "The page you requested does not exist.",
            ApiError::InternalError(_) => "Something went wrong while searching. Please try again later.",
        };
        error_page(status, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store failure: {}", err);
        ApiError::InternalError(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal failure: {:#}", err);
        ApiError::InternalError(err.to_string())
    }
}
