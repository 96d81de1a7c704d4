use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::repository::query_builder::QueryError;
use crate::repository::repository_error::RepositoryError;
use crate::util::email::EmailError;
use crate::util::jwt::JwtError;
use crate::util::password::PasswordError;

/// Message sent to clients for failures we do not classify.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong! Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::BadRequest => "BadRequest",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Internal => "Internal",
        };
        write!(f, "{}", s)
    }
}

impl HandlerErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by every handler. Rendered as `{"status": "fail"|"error", "message": ...}`.
#[derive(Debug)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn new(error: HandlerErrorKind, message: impl Into<String>) -> Self {
        HandlerError { error, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Internal, message)
    }

    /// `fail` for client errors, `error` for server errors.
    pub fn status_label(&self) -> &'static str {
        if self.error.status_code().is_server_error() {
            "error"
        } else {
            "fail"
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = Json(json!({
            "status": self.status_label(),
            "message": self.message,
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Validation(String),
    Authentication(String),
    Authorization(String),
    NotFound(String),
    /// Outbound mail failed; the message is safe to show to the client.
    EmailDelivery(String),
    Internal(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            ServiceError::Authentication(msg) => write!(f, "Authentication Error: {}", msg),
            ServiceError::Authorization(msg) => write!(f, "Authorization Error: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::EmailDelivery(msg) => write!(f, "Email Delivery Error: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::Validation(msg),
            RepositoryError::AlreadyExists(msg) => ServiceError::Validation(msg),
            RepositoryError::DatabaseError(msg) => ServiceError::Internal(msg),
            RepositoryError::ConnectionError(msg) => ServiceError::Internal(msg),
            RepositoryError::SerializationError(msg) => ServiceError::Internal(msg),
            RepositoryError::Generic(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingFailed(msg) => ServiceError::Internal(format!("JWT error: {}", msg)),
            JwtError::TokenExpired => {
                ServiceError::Authentication("Your session has expired. Please login again.".to_string())
            }
            JwtError::DecodingFailed(_) | JwtError::InvalidToken => {
                ServiceError::Authentication("Invalid token. Please login again.".to_string())
            }
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<EmailError> for ServiceError {
    fn from(err: EmailError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => HandlerError::bad_request(msg),
            ServiceError::Authentication(msg) => HandlerError::unauthorized(msg),
            ServiceError::Authorization(msg) => HandlerError::forbidden(msg),
            ServiceError::NotFound(msg) => HandlerError::not_found(msg),
            ServiceError::EmailDelivery(msg) => HandlerError::internal(msg),
            ServiceError::Internal(msg) => {
                error!("Unhandled internal error: {}", msg);
                HandlerError::internal(GENERIC_ERROR_MESSAGE)
            }
        }
    }
}
