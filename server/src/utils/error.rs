use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::codec::TokenError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

const AUTH_FAILED: &str = "Authentication failed";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Participant is already registered for this event")]
    DuplicateRegistration,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token class not accepted here")]
    WrongTokenClass,

    #[error("Authorization header required")]
    MissingCredential,

    #[error("Invalid authorization header format")]
    MalformedCredential,

    #[error("Token subject not found")]
    SubjectNotFound,

    #[error("Token subject no longer exists")]
    SubjectGone,

    #[error("Refresh token does not match the active session")]
    RefreshMismatch,

    #[error("Role has changed since the token was issued")]
    RoleDrift,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Ticket not found")]
    TicketNotFound,

    #[error("Ticket is canceled and cannot be used")]
    TicketCanceled,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error")]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl From<TokenError> for AppError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::WrongClass { .. } => AppError::WrongTokenClass,
            TokenError::Invalid(_) => AppError::InvalidToken,
            TokenError::Signing(reason) => AppError::InternalServerError(reason),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail
            | AppError::DuplicateRegistration
            | AppError::TicketCanceled => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::WrongTokenClass
            | AppError::MissingCredential
            | AppError::MalformedCredential
            | AppError::SubjectNotFound
            | AppError::SubjectGone
            | AppError::RefreshMismatch
            | AppError::RoleDrift => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::TicketNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code. Authentication failures share one code except
    /// where the client must act differently (log in again or refresh).
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::RoleDrift => "ROLE_CHANGED",
            AppError::InvalidToken
            | AppError::WrongTokenClass
            | AppError::MissingCredential
            | AppError::MalformedCredential
            | AppError::SubjectNotFound
            | AppError::SubjectGone
            | AppError::RefreshMismatch => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::TicketNotFound => "TICKET_NOT_FOUND",
            AppError::TicketCanceled => "TICKET_CANCELED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Store(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Store(e) => {
                error!(error = ?e, "Storage error");
            }
            AppError::InternalServerError(msg) => {
                error!(message = %msg, "Internal error");
            }
            other if other.status_code() == StatusCode::UNAUTHORIZED => {
                warn!(reason = %other, "Authentication rejected");
            }
            other => {
                warn!(error = %other, "Request rejected");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Store(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "Internal server error".to_string(),
            other if other.status_code() == StatusCode::UNAUTHORIZED => AUTH_FAILED.to_string(),
            AppError::ValidationError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        error_response(code, self.public_message(), None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_share_a_generic_message() {
        for err in [
            AppError::InvalidToken,
            AppError::MissingCredential,
            AppError::MalformedCredential,
            AppError::RefreshMismatch,
            AppError::SubjectGone,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), AUTH_FAILED);
            assert_eq!(err.code(), "AUTH_ERROR");
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::Store(StoreError::Unavailable("pool exhausted".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("pool"));
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::TicketCanceled.status_code(), StatusCode::CONFLICT);
    }
}
