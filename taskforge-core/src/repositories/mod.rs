//! Repository traits for the data access layer.
//!
//! Services interact with storage only through these interfaces; the
//! backend behind them is the application's choice.
//!
//! # Trait hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data
//!   domain.
//! - Individual `*RepositoryProvider` traits provide access to each
//!   repository type.
//! - [`RepositoryProvider`] is a supertrait combining all provider traits
//!   plus lifecycle methods.
//!
//! The `*RepositoryAdapter` types let generic services borrow a single
//! repository out of a shared provider.

pub mod adapter;
pub mod code;
pub mod todo;
pub mod user;

pub use adapter::{CodeRepositoryAdapter, TodoRepositoryAdapter, UserRepositoryAdapter};
pub use code::CodeRepository;
pub use todo::TodoRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    /// The user repository implementation type
    type UserRepo: UserRepository;

    /// Get the user repository
    fn users(&self) -> &Self::UserRepo;
}

/// Provider trait for verification code repository access.
pub trait CodeRepositoryProvider: Send + Sync + 'static {
    /// The code repository implementation type
    type CodeRepo: CodeRepository;

    /// Get the code repository
    fn codes(&self) -> &Self::CodeRepo;
}

/// Provider trait for task item repository access.
pub trait TodoRepositoryProvider: Send + Sync + 'static {
    /// The todo repository implementation type
    type TodoRepo: TodoRepository;

    /// Get the todo repository
    fn todos(&self) -> &Self::TodoRepo;
}

/// Provider trait that storage backends implement to expose all
/// repositories, plus lifecycle methods for schema setup and health checks.
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider + CodeRepositoryProvider + TodoRepositoryProvider
{
    /// Prepare the underlying schema
    async fn migrate(&self) -> Result<(), Error>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<(), Error>;
}
