use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use taskforge_core::error::{AuthError as CoreAuthError, Error, TokenError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("User not found")]
    UserNotFound,

    #[error("Username or email is already in use")]
    DuplicateIdentity,

    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    InternalError,
}

impl From<Error> for AuthError {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(CoreAuthError::DuplicateIdentity) => AuthError::DuplicateIdentity,
            Error::Auth(CoreAuthError::UserNotFound) => AuthError::UserNotFound,
            Error::Auth(CoreAuthError::InvalidCredentials) => AuthError::InvalidCredentials,
            Error::Auth(CoreAuthError::AccountDisabled) => AuthError::AccountDisabled,
            Error::Auth(CoreAuthError::InvalidCode) => AuthError::InvalidCode,
            Error::Auth(CoreAuthError::PasswordHash(_)) => AuthError::InternalError,
            Error::Token(TokenError::Expired) | Error::Token(TokenError::Invalid(_)) => {
                AuthError::InvalidToken
            }
            Error::Validation(e) => AuthError::BadRequest(e.to_string()),
            // Storage and mail failures stay generic so internals never
            // leak to the client
            Error::Storage(_) | Error::Mail(_) => AuthError::InternalError,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Unauthorized
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::InvalidCode | AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
