//! Verification code model.
//!
//! A code is a short-lived, single-use 6-digit credential proving control
//! of an email address. Several unconsumed codes for the same
//! (email, purpose) pair may coexist; issuing a new code never invalidates
//! older ones, so a "resend" always works.

use crate::id::generate_prefixed_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a verification code is allowed to prove.
///
/// Purposes are isolated from each other: a code issued for email
/// verification can never be consumed for a password reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePurpose {
    EmailVerification,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::EmailVerification => "email_verification",
            CodePurpose::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CodePurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(CodePurpose::EmailVerification),
            "password_reset" => Ok(CodePurpose::PasswordReset),
            other => Err(format!("Unknown code purpose: {other}")),
        }
    }
}

/// A stored verification code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    pub id: String,

    /// The email address the code was issued for.
    pub email: String,

    /// The 6-digit plaintext code.
    pub code: String,

    pub purpose: CodePurpose,

    pub expires_at: DateTime<Utc>,

    /// Set exactly once, by the atomic consume in the code store.
    pub used: bool,

    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    /// A code is valid iff it has not been consumed and has not expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Input for inserting a verification code record.
#[derive(Debug, Clone)]
pub struct NewVerificationCode {
    pub id: String,
    pub email: String,
    pub code: String,
    pub purpose: CodePurpose,
    pub expires_at: DateTime<Utc>,
}

impl NewVerificationCode {
    pub fn new(
        email: String,
        code: String,
        purpose: CodePurpose,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_prefixed_id("vc"),
            email,
            code,
            purpose,
            expires_at,
        }
    }
}
