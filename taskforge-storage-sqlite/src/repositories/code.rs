use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use taskforge_core::{
    Error,
    code::{CodePurpose, NewVerificationCode, VerificationCode},
    error::StorageError,
    repositories::CodeRepository,
};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteVerificationCode {
    id: String,
    email: String,
    code: String,
    purpose: String,
    expires_at: i64,
    used: bool,
    created_at: i64,
}

impl TryFrom<SqliteVerificationCode> for VerificationCode {
    type Error = Error;

    fn try_from(row: SqliteVerificationCode) -> Result<Self, Error> {
        let purpose = row
            .purpose
            .parse::<CodePurpose>()
            .map_err(StorageError::Database)?;

        Ok(VerificationCode {
            id: row.id,
            email: row.email,
            code: row.code,
            purpose,
            expires_at: DateTime::from_timestamp(row.expires_at, 0).unwrap_or_default(),
            used: row.used,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        })
    }
}

pub struct SqliteCodeRepository {
    pool: SqlitePool,
}

impl SqliteCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeRepository for SqliteCodeRepository {
    async fn insert(&self, code: NewVerificationCode) -> Result<VerificationCode, Error> {
        let row = sqlx::query_as::<_, SqliteVerificationCode>(
            r#"
            INSERT INTO verification_codes (id, email, code, purpose, expires_at, used, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            RETURNING *
            "#,
        )
        .bind(&code.id)
        .bind(&code.email)
        .bind(&code.code)
        .bind(code.purpose.as_str())
        .bind(code.expires_at.timestamp())
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        row.try_into()
    }

    async fn find_and_consume(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, Error> {
        // Single conditional update: the row is matched and marked used in
        // one statement, so two racing callers can never both consume it.
        let row = sqlx::query_as::<_, SqliteVerificationCode>(
            r#"
            UPDATE verification_codes
            SET used = 1
            WHERE id IN (
                SELECT id FROM verification_codes
                WHERE email = ?1 AND code = ?2 AND purpose = ?3 AND used = 0 AND expires_at > ?4
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(purpose.as_str())
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn mark_all_used(&self, email: &str, purpose: CodePurpose) -> Result<(), Error> {
        sqlx::query("UPDATE verification_codes SET used = 1 WHERE email = ?1 AND purpose = ?2")
            .bind(email)
            .bind(purpose.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn delete_expired_before(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE expires_at < ?1")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(result.rows_affected())
    }
}
