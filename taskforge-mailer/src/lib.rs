//! Email delivery for taskforge.
//!
//! This crate defines the [`Mailer`] contract used by the rest of the
//! workspace and ships two transports built on lettre: SMTP for real
//! deployments and a file transport for local development, where every
//! message is written to disk instead of being sent.
//!
//! All messages are plain text. Bodies are composed by the caller; this
//! crate only carries them to a transport.

pub mod config;
pub mod email;
pub mod error;
pub mod mailer;
pub mod transports;

pub use config::{MailerConfig, TransportConfig};
pub use email::{Email, EmailBuilder};
pub use error::MailerError;
pub use mailer::Mailer;
pub use transports::{FileTransport, SmtpTransport, TlsConfig};
