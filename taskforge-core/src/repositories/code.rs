use crate::{
    Error,
    code::{CodePurpose, NewVerificationCode, VerificationCode},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for verification code data access.
#[async_trait]
pub trait CodeRepository: Send + Sync + 'static {
    /// Insert a new code record. Existing codes for the same (email,
    /// purpose) pair are left untouched.
    async fn insert(&self, code: NewVerificationCode) -> Result<VerificationCode, Error>;

    /// Atomically find and consume the unused code matching (email, code,
    /// purpose).
    ///
    /// This must behave as a single conditional update: the record is
    /// returned only if it was unused and unexpired at `now`, and marking
    /// it used happens in the same operation. Two concurrent calls racing
    /// on the same code yield at most one `Some`.
    async fn find_and_consume(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, Error>;

    /// Mark every code for (email, purpose) as used, regardless of expiry.
    async fn mark_all_used(&self, email: &str, purpose: CodePurpose) -> Result<(), Error>;

    /// Delete all codes with `expires_at < now`, used or not. Returns the
    /// number of deleted records. Idempotent.
    async fn delete_expired_before(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
