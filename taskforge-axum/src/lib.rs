//! Axum integration for taskforge.
//!
//! [`auth_middleware`] implements the request authenticator: it attaches
//! the authenticated user to the request extensions when a valid bearer
//! token is present and otherwise lets the request continue
//! unauthenticated (fail-open). Handlers that need identity must opt in
//! explicitly with [`require_auth`] or the [`AuthUser`] extractor; that
//! pairing is what keeps the fail-open design safe.

pub mod error;
pub mod extractors;
pub mod middleware;

pub use error::AuthError;
pub use extractors::{AuthUser, OptionalAuthUser};
pub use middleware::{AuthState, auth_middleware, require_auth};
