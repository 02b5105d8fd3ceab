#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use taskforge::{Mailer, SqliteRepositoryProvider, Taskforge, TaskforgeConfig};
use taskforge_mailer::{Email, MailerError};

/// Records every message instead of sending it, so tests can read the
/// verification codes out of the captured bodies.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestHarness {
    pub taskforge: Taskforge<SqliteRepositoryProvider>,
    pub repositories: Arc<SqliteRepositoryProvider>,
    pub mailer: Arc<RecordingMailer>,
}

/// Fresh in-memory backend with a recording mail transport.
///
/// The pool is capped at one connection; each pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn setup() -> TestHarness {
    setup_with_config(TaskforgeConfig::new(
        b"integration_test_secret_key".to_vec(),
    ))
    .await
}

pub async fn setup_with_config(config: TaskforgeConfig) -> TestHarness {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
    let mailer = Arc::new(RecordingMailer::default());

    let taskforge =
        Taskforge::with_mailer(repositories.clone(), config, mailer.clone()).unwrap();
    taskforge.migrate().await.unwrap();

    TestHarness {
        taskforge,
        repositories,
        mailer,
    }
}

/// Wait until at least `count` messages were captured. Panics after two
/// seconds; fire-and-forget dispatch should land well before that.
pub async fn wait_for_mail(mailer: &RecordingMailer, count: usize) {
    for _ in 0..200 {
        if mailer.sent.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("expected {count} captured emails");
}

/// Pull the 6-digit code out of a captured email body.
pub fn extract_code(body: &str) -> String {
    body.lines()
        .find_map(|line| {
            line.strip_prefix("Verification Code: ")
                .or_else(|| line.strip_prefix("Reset Code: "))
        })
        .expect("no code in email body")
        .trim()
        .to_string()
}
