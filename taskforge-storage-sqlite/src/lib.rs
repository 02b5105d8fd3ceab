//! SQLite storage backend.
//!
//! Implements the `taskforge-core` repository traits against a
//! [`sqlx::SqlitePool`]. Timestamps are stored as Unix seconds; booleans as
//! integers. The verify-and-consume step is a single conditional `UPDATE`,
//! which is what makes concurrent code consumption safe.

pub mod repositories;

pub use repositories::{SqliteCodeRepository, SqliteTodoRepository, SqliteUserRepository};

use async_trait::async_trait;
use sqlx::SqlitePool;
use taskforge_core::{
    Error,
    error::StorageError,
    repositories::{
        CodeRepositoryProvider, RepositoryProvider, TodoRepositoryProvider, UserRepositoryProvider,
    },
};

/// Repository provider backed by a single SQLite pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    users: SqliteUserRepository,
    codes: SqliteCodeRepository,
    todos: SqliteTodoRepository,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: SqliteUserRepository::new(pool.clone()),
            codes: SqliteCodeRepository::new(pool.clone()),
            todos: SqliteTodoRepository::new(pool.clone()),
            pool,
        }
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn users(&self) -> &Self::UserRepo {
        &self.users
    }
}

impl CodeRepositoryProvider for SqliteRepositoryProvider {
    type CodeRepo = SqliteCodeRepository;

    fn codes(&self) -> &Self::CodeRepo {
        &self.codes
    }
}

impl TodoRepositoryProvider for SqliteRepositoryProvider {
    type TodoRepo = SqliteTodoRepository;

    fn todos(&self) -> &Self::TodoRepo {
        &self.todos
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        }

        tracing::info!("SQLite schema is up to date");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;

        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        enabled INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS verification_codes (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        code TEXT NOT NULL,
        purpose TEXT NOT NULL,
        expires_at INTEGER NOT NULL,
        used INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_verification_codes_lookup
        ON verification_codes (email, code, purpose)",
    "CREATE INDEX IF NOT EXISTS idx_verification_codes_expiry
        ON verification_codes (expires_at)",
    r#"
    CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        completed INTEGER NOT NULL DEFAULT 0,
        due_date INTEGER,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_todos_due ON todos (due_date, completed)",
];

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection in-memory pool; every pooled connection would
    /// otherwise get its own empty database.
    pub(crate) async fn memory_provider() -> SqliteRepositoryProvider {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let provider = SqliteRepositoryProvider::new(pool);
        provider.migrate().await.unwrap();
        provider
    }
}
