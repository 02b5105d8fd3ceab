//! Service layer for business logic.
//!
//! Concrete service implementations encapsulating the identity and
//! verification lifecycle. Each service takes its repository dependencies
//! as constructor parameters; there is no ambient service lookup.

pub mod auth;
pub mod notifier;
pub mod reminder;
pub mod verification;

pub use auth::{AuthService, AuthSession, NewRegistration};
pub use notifier::Notifier;
pub use reminder::ReminderService;
pub use verification::VerificationService;
