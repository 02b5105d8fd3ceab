//! Verification code lifecycle.
//!
//! Codes are 6-digit, single-use, time-bounded credentials proving control
//! of an email address. Generation never invalidates previously issued
//! codes for the same address and purpose, so resending a code does not
//! break the one already sitting in the user's inbox.

use crate::{
    AppConfig, Error,
    code::{CodePurpose, NewVerificationCode, VerificationCode},
    repositories::CodeRepository,
};
use chrono::{DateTime, Duration, Utc};
use rand::{TryRngCore, rngs::OsRng};
use std::sync::Arc;

const CODE_LENGTH: usize = 6;

/// Generate a uniformly random string of [`CODE_LENGTH`] ASCII digits.
///
/// Bytes from the OS RNG are rejection-sampled below 250 (the largest
/// multiple of 10 that fits a byte) so `b % 10` is exactly uniform.
fn generate_code() -> String {
    let mut digits = String::with_capacity(CODE_LENGTH);
    let mut buf = [0u8; 16];

    while digits.len() < CODE_LENGTH {
        OsRng
            .try_fill_bytes(&mut buf)
            .expect("OS RNG failure - system entropy source unavailable");

        for &b in &buf {
            if b < 250 {
                digits.push(char::from(b'0' + b % 10));
                if digits.len() == CODE_LENGTH {
                    break;
                }
            }
        }
    }

    digits
}

/// Service for generating, consuming, and expiring verification codes.
pub struct VerificationService<C: CodeRepository> {
    codes: Arc<C>,
    code_expiry: Duration,
    cleanup_interval: std::time::Duration,
}

impl<C: CodeRepository> VerificationService<C> {
    pub fn new(codes: Arc<C>, config: &AppConfig) -> Self {
        Self {
            codes,
            code_expiry: config.code_expiry,
            cleanup_interval: config.cleanup_interval,
        }
    }

    /// Generate and store a fresh code using the configured expiry.
    ///
    /// Returns the stored record; the plaintext code is in `code` and is
    /// the caller's to deliver.
    pub async fn generate(
        &self,
        email: &str,
        purpose: CodePurpose,
    ) -> Result<VerificationCode, Error> {
        self.generate_with_expiry(email, purpose, self.code_expiry)
            .await
    }

    /// Generate and store a fresh code with a custom expiry.
    pub async fn generate_with_expiry(
        &self,
        email: &str,
        purpose: CodePurpose,
        expires_in: Duration,
    ) -> Result<VerificationCode, Error> {
        let code = generate_code();
        let expires_at = Utc::now() + expires_in;

        let record = self
            .codes
            .insert(NewVerificationCode::new(
                email.to_string(),
                code,
                purpose,
                expires_at,
            ))
            .await?;

        tracing::info!(email = email, purpose = %purpose, "Generated verification code");

        Ok(record)
    }

    /// Check and consume a code.
    ///
    /// Returns `true` exactly once per code: the lookup and the used-flag
    /// update are a single atomic operation in the store, so concurrent
    /// calls racing on the same code cannot both succeed. Invalid, expired,
    /// and already-used codes all return `false` without mutation.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> Result<bool, Error> {
        let consumed = self
            .codes
            .find_and_consume(email, code, purpose, Utc::now())
            .await?;

        match consumed {
            Some(_) => {
                tracing::info!(email = email, purpose = %purpose, "Verification code accepted");
                Ok(true)
            }
            None => {
                tracing::warn!(
                    email = email,
                    purpose = %purpose,
                    "Invalid or expired verification code"
                );
                Ok(false)
            }
        }
    }

    /// Invalidate every outstanding code for (email, purpose). Used after a
    /// flow completes through another path so stale codes cannot be
    /// replayed.
    pub async fn mark_all_used(&self, email: &str, purpose: CodePurpose) -> Result<(), Error> {
        self.codes.mark_all_used(email, purpose).await
    }

    /// Delete every code that expired before `now`, consumed or not.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let deleted = self.codes.delete_expired_before(now).await?;

        if deleted > 0 {
            tracing::info!(count = deleted, "Cleaned up expired verification codes");
        }

        Ok(deleted)
    }

    /// Start the periodic expired-code cleanup.
    ///
    /// Runs until `shutdown` flips; a failing run is logged and the next
    /// run happens on schedule regardless.
    pub fn start_cleanup_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let codes = Arc::clone(&self.codes);
        let cleanup_interval = self.cleanup_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match codes.delete_expired_before(Utc::now()).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(count = count, "Cleaned up expired verification codes");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to clean up expired verification codes");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down verification code cleanup task");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockCodeRepository {
        codes: Arc<Mutex<HashMap<String, VerificationCode>>>,
    }

    #[async_trait]
    impl CodeRepository for MockCodeRepository {
        async fn insert(&self, code: NewVerificationCode) -> Result<VerificationCode, Error> {
            let record = VerificationCode {
                id: code.id.clone(),
                email: code.email,
                code: code.code,
                purpose: code.purpose,
                expires_at: code.expires_at,
                used: false,
                created_at: Utc::now(),
            };

            self.codes.lock().await.insert(code.id, record.clone());
            Ok(record)
        }

        async fn find_and_consume(
            &self,
            email: &str,
            code: &str,
            purpose: CodePurpose,
            now: DateTime<Utc>,
        ) -> Result<Option<VerificationCode>, Error> {
            let mut codes = self.codes.lock().await;

            let found = codes.values_mut().find(|c| {
                c.email == email && c.code == code && c.purpose == purpose && c.is_valid(now)
            });

            if let Some(record) = found {
                record.used = true;
                Ok(Some(record.clone()))
            } else {
                Ok(None)
            }
        }

        async fn mark_all_used(&self, email: &str, purpose: CodePurpose) -> Result<(), Error> {
            let mut codes = self.codes.lock().await;
            for record in codes.values_mut() {
                if record.email == email && record.purpose == purpose {
                    record.used = true;
                }
            }
            Ok(())
        }

        async fn delete_expired_before(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            let mut codes = self.codes.lock().await;
            let before = codes.len();
            codes.retain(|_, record| record.expires_at >= now);
            Ok((before - codes.len()) as u64)
        }
    }

    fn test_service(repo: Arc<MockCodeRepository>) -> VerificationService<MockCodeRepository> {
        VerificationService::new(repo, &AppConfig::default())
    }

    #[tokio::test]
    async fn test_generate_produces_six_ascii_digits() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        for _ in 0..50 {
            let record = service
                .generate("alice@example.com", CodePurpose::EmailVerification)
                .await
                .unwrap();

            assert_eq!(record.code.len(), 6);
            assert!(record.code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_generate_does_not_invalidate_prior_codes() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let first = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();
        let _second = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        // The older code still verifies
        let verified = service
            .verify(
                "alice@example.com",
                &first.code,
                CodePurpose::EmailVerification,
            )
            .await
            .unwrap();
        assert!(verified);
    }

    #[tokio::test]
    async fn test_verify_consumes_exactly_once() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let record = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        let first = service
            .verify(
                "alice@example.com",
                &record.code,
                CodePurpose::EmailVerification,
            )
            .await
            .unwrap();
        assert!(first);

        let second = service
            .verify(
                "alice@example.com",
                &record.code,
                CodePurpose::EmailVerification,
            )
            .await
            .unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_code() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let record = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        let wrong = if record.code == "000000" {
            "000001"
        } else {
            "000000"
        };

        let verified = service
            .verify("alice@example.com", wrong, CodePurpose::EmailVerification)
            .await
            .unwrap();
        assert!(!verified);

        // The real code was not consumed by the failed attempt
        let verified = service
            .verify(
                "alice@example.com",
                &record.code,
                CodePurpose::EmailVerification,
            )
            .await
            .unwrap();
        assert!(verified);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_purpose() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let record = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        let verified = service
            .verify(
                "alice@example.com",
                &record.code,
                CodePurpose::PasswordReset,
            )
            .await
            .unwrap();
        assert!(!verified);
    }

    #[tokio::test]
    async fn test_verify_rejects_expired_code() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let record = service
            .generate_with_expiry(
                "alice@example.com",
                CodePurpose::EmailVerification,
                Duration::minutes(-1),
            )
            .await
            .unwrap();

        let verified = service
            .verify(
                "alice@example.com",
                &record.code,
                CodePurpose::EmailVerification,
            )
            .await
            .unwrap();
        assert!(!verified);
    }

    #[tokio::test]
    async fn test_concurrent_verify_single_success() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = Arc::new(test_service(repo.clone()));

        let record = service
            .generate("alice@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        let a = {
            let service = Arc::clone(&service);
            let code = record.code.clone();
            tokio::spawn(async move {
                service
                    .verify("alice@example.com", &code, CodePurpose::EmailVerification)
                    .await
                    .unwrap()
            })
        };
        let b = {
            let service = Arc::clone(&service);
            let code = record.code.clone();
            tokio::spawn(async move {
                service
                    .verify("alice@example.com", &code, CodePurpose::EmailVerification)
                    .await
                    .unwrap()
            })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_ne!(a, b, "exactly one of two racing verifies must succeed");
    }

    #[tokio::test]
    async fn test_mark_all_used() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let first = service
            .generate("alice@example.com", CodePurpose::PasswordReset)
            .await
            .unwrap();
        let second = service
            .generate("alice@example.com", CodePurpose::PasswordReset)
            .await
            .unwrap();

        service
            .mark_all_used("alice@example.com", CodePurpose::PasswordReset)
            .await
            .unwrap();

        for code in [&first.code, &second.code] {
            let verified = service
                .verify("alice@example.com", code, CodePurpose::PasswordReset)
                .await
                .unwrap();
            assert!(!verified);
        }
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        let expired_unused = service
            .generate_with_expiry(
                "alice@example.com",
                CodePurpose::EmailVerification,
                Duration::minutes(-10),
            )
            .await
            .unwrap();
        let expired_used = service
            .generate_with_expiry(
                "bob@example.com",
                CodePurpose::PasswordReset,
                Duration::minutes(-10),
            )
            .await
            .unwrap();
        let live = service
            .generate("carol@example.com", CodePurpose::EmailVerification)
            .await
            .unwrap();

        // Consume one of the expired codes' records directly so it is used
        repo.codes
            .lock()
            .await
            .get_mut(&expired_used.id)
            .unwrap()
            .used = true;

        let deleted = service.cleanup_expired(Utc::now()).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = repo.codes.lock().await;
        assert!(!remaining.contains_key(&expired_unused.id));
        assert!(!remaining.contains_key(&expired_used.id));
        assert!(remaining.contains_key(&live.id));
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let repo = Arc::new(MockCodeRepository::default());
        let service = test_service(repo.clone());

        assert_eq!(service.cleanup_expired(Utc::now()).await.unwrap(), 0);
        assert_eq!(service.cleanup_expired(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_task_runs_and_stops() {
        let repo = Arc::new(MockCodeRepository::default());
        let mut config = AppConfig::default();
        config.cleanup_interval = std::time::Duration::from_millis(20);
        let service = VerificationService::new(repo.clone(), &config);

        service
            .generate_with_expiry(
                "alice@example.com",
                CodePurpose::EmailVerification,
                Duration::minutes(-10),
            )
            .await
            .unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let handle = service.start_cleanup_task(shutdown_rx);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(repo.codes.lock().await.is_empty());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
