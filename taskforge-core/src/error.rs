use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Mail dispatch error: {0}")]
    Mail(#[from] taskforge_mailer::MailerError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username or email is already in use")]
    DuplicateIdentity,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

/// Session token failures. Signature mismatch and malformed input collapse
/// into `Invalid`; expiry is its own variant so callers can distinguish a
/// stale session from a forged one.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    /// Rejections the caller caused: surfaced with their message intact.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::Validation(_) | Error::Token(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
