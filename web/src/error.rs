use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::responder::ErrorData;

/// Error type for the API. The display string is exactly what the client sees.
#[derive(Clone, Copy, Error, Debug, PartialEq)]
pub enum ApiError {
    /// A path or query parameter was malformed or out of range.
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The backend failed; details are logged, never returned.
    #[error("{0}")]
    Backend(&'static str),

    #[error("Internal server error")]
    Unhandled,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Backend(_) | ApiError::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorData::from_error(self))
    }
}

impl From<BlockingError> for ApiError {
    fn from(e: BlockingError) -> Self {
        error!("Blocking task failed: {}", e);
        ApiError::Unhandled
    }
}
