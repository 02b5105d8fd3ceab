use crate::{Email, MailerError};
use async_trait::async_trait;

/// Transport-agnostic delivery contract.
///
/// Implementations must be cheap to share behind an `Arc`; callers decide
/// whether a send is awaited or detached.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: Email) -> Result<(), MailerError>;
}
