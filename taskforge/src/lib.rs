//! # Taskforge
//!
//! Taskforge is a per-user task-list backend whose account layer is gated
//! behind single-use email verification codes. It gives you:
//!
//! - registration that parks the account disabled until the owner proves
//!   control of their email address with a 6-digit code,
//! - login issuing signed, self-contained session tokens,
//! - password reset driven by the same code mechanism,
//! - background jobs that purge expired codes and mail reminders for items
//!   coming due.
//!
//! Storage lives behind the repository traits in `taskforge-core`; the
//! `sqlite` feature (on by default) pulls in the reference backend.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskforge::{Taskforge, TaskforgeConfig, SqliteRepositoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::SqlitePool::connect("sqlite:taskforge.db").await?;
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let config = TaskforgeConfig::new(b"change-me-in-production".to_vec());
//!     let taskforge = Taskforge::new(repositories, config)?;
//!
//!     taskforge.migrate().await?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let _tasks = taskforge.start_background_tasks(shutdown_rx);
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use taskforge_core::{
    error::AuthError,
    repositories::{
        CodeRepositoryAdapter, RepositoryProvider, TodoRepositoryAdapter, UserRepository,
        UserRepositoryAdapter,
    },
    services::{AuthService, Notifier, ReminderService, VerificationService},
};

/// Re-export core types commonly used alongside the facade.
pub use taskforge_core::{
    AppConfig, CodePurpose, Error, NewTodo, Todo, TokenAlgorithm, TokenConfig, TokenService, User,
    UserId, VerificationCode,
};
pub use taskforge_core::services::{AuthSession, NewRegistration};
pub use taskforge_mailer::{Mailer, MailerConfig};

#[cfg(feature = "sqlite")]
pub use taskforge_storage_sqlite::SqliteRepositoryProvider;

/// Everything the coordinator needs to run: scheduler/code settings, the
/// token signing setup, and the mail transport.
pub struct TaskforgeConfig {
    pub app: AppConfig,
    pub token: TokenConfig,
    pub mailer: MailerConfig,
}

impl TaskforgeConfig {
    /// Defaults everywhere, HS256 signing with the given secret.
    pub fn new(token_secret: Vec<u8>) -> Self {
        Self {
            app: AppConfig::default(),
            token: TokenConfig::new_hs256(token_secret),
            mailer: MailerConfig::default(),
        }
    }

    /// Build the full configuration from the environment.
    ///
    /// `TASKFORGE_TOKEN_SECRET` is mandatory; everything else falls back to
    /// defaults.
    pub fn from_env() -> Result<Self, Error> {
        let secret = std::env::var("TASKFORGE_TOKEN_SECRET").map_err(|_| {
            taskforge_core::error::ValidationError::MissingField(
                "TASKFORGE_TOKEN_SECRET is required".to_string(),
            )
        })?;

        let mut token = TokenConfig::new_hs256(secret.into_bytes());

        if let Ok(hours) = std::env::var("TASKFORGE_TOKEN_LIFETIME_HOURS") {
            if let Ok(hours) = hours.parse() {
                token = token.with_lifetime(chrono::Duration::hours(hours));
            }
        }

        if let Ok(issuer) = std::env::var("TASKFORGE_TOKEN_ISSUER") {
            token = token.with_issuer(issuer);
        }

        Ok(Self {
            app: AppConfig::from_env(),
            token,
            mailer: MailerConfig::from_env()?,
        })
    }
}

/// The central coordinator.
///
/// Wires the services together over a shared repository provider and
/// exposes the boundary operations the transport layer calls.
pub struct Taskforge<R: RepositoryProvider> {
    repositories: Arc<R>,
    users: Arc<UserRepositoryAdapter<R>>,
    tokens: Arc<TokenService>,
    notifier: Arc<Notifier>,
    auth: Arc<AuthService<UserRepositoryAdapter<R>>>,
    verification: Arc<VerificationService<CodeRepositoryAdapter<R>>>,
    reminders: Arc<ReminderService<TodoRepositoryAdapter<R>, UserRepositoryAdapter<R>>>,
}

impl<R: RepositoryProvider> Taskforge<R> {
    /// Create a coordinator, building the mail transport from the config.
    pub fn new(repositories: Arc<R>, config: TaskforgeConfig) -> Result<Self, Error> {
        let mailer: Arc<dyn Mailer> = Arc::from(config.mailer.build_transport()?);
        Self::with_mailer(repositories, config, mailer)
    }

    /// Create a coordinator with a caller-supplied mail transport.
    pub fn with_mailer(
        repositories: Arc<R>,
        config: TaskforgeConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, Error> {
        let users = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let codes = Arc::new(CodeRepositoryAdapter::new(repositories.clone()));
        let todos = Arc::new(TodoRepositoryAdapter::new(repositories.clone()));

        let tokens = Arc::new(TokenService::new(config.token));
        let notifier = Arc::new(Notifier::new(mailer, &config.mailer, &config.app));

        let auth = Arc::new(AuthService::new(users.clone(), tokens.clone()));
        let verification = Arc::new(VerificationService::new(codes, &config.app));
        let reminders = Arc::new(ReminderService::new(
            todos,
            users.clone(),
            notifier.clone(),
            &config.app,
        ));

        Ok(Self {
            repositories,
            users,
            tokens,
            notifier,
            auth,
            verification,
            reminders,
        })
    }

    /// Register a new account and dispatch its email-verification code.
    ///
    /// The user is created disabled. Code delivery is fire-and-forget: the
    /// code is persisted first, so a failed send can always be recovered by
    /// a resend.
    pub async fn register(&self, input: NewRegistration) -> Result<User, Error> {
        let user = self.auth.register(input).await?;

        let code = self
            .verification
            .generate(&user.email, CodePurpose::EmailVerification)
            .await?;

        self.notifier
            .dispatch_verification_code(&user.email, &user.username, &code.code);

        Ok(user)
    }

    /// Authenticate with a username or email plus password.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthSession, Error> {
        self.auth.login(username_or_email, password).await
    }

    /// Generate and deliver a fresh verification code.
    ///
    /// Safe to call repeatedly; earlier codes stay valid. Email
    /// verification codes go out fire-and-forget; password reset codes are
    /// sent synchronously so the caller knows delivery succeeded before
    /// responding.
    pub async fn request_verification_code(
        &self,
        email: &str,
        username: &str,
        purpose: CodePurpose,
    ) -> Result<(), Error> {
        let code = self.verification.generate(email, purpose).await?;

        match purpose {
            CodePurpose::EmailVerification => {
                self.notifier
                    .dispatch_verification_code(email, username, &code.code);
            }
            CodePurpose::PasswordReset => {
                self.notifier
                    .send_password_reset_code(email, username, &code.code)
                    .await?;
            }
        }

        Ok(())
    }

    /// Check and consume a verification code without any follow-up action.
    pub async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> Result<bool, Error> {
        self.verification.verify(email, code, purpose).await
    }

    /// Consume an email-verification code and activate the account.
    ///
    /// Returns `false` when the code is invalid or when no account exists
    /// for the email; the caller cannot distinguish the two, on purpose.
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<bool, Error> {
        if !self
            .verification
            .verify(email, code, CodePurpose::EmailVerification)
            .await?
        {
            return Ok(false);
        }

        match self.auth.activate(email).await {
            Ok(_) => Ok(true),
            Err(Error::Auth(AuthError::UserNotFound)) => {
                tracing::error!(email = email, "No user to activate for verified email");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Complete a password reset: consume the code, replace the password,
    /// and invalidate any other outstanding reset codes.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        if !self
            .verification
            .verify(email, code, CodePurpose::PasswordReset)
            .await?
        {
            return Err(AuthError::InvalidCode.into());
        }

        self.auth.reset_password(email, new_password).await?;

        self.verification
            .mark_all_used(email, CodePurpose::PasswordReset)
            .await?;

        Ok(())
    }

    /// Validate a session token and resolve its subject to a live user.
    pub async fn authenticate_token(&self, token: &str) -> Result<User, Error> {
        let subject = self.tokens.validate(token)?;

        self.users
            .find_by_username(&subject)
            .await?
            .ok_or_else(|| AuthError::UserNotFound.into())
    }

    /// Look up a user by username.
    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.users.find_by_username(username).await
    }

    /// Start the cleanup and reminder loops. Both stop when `shutdown`
    /// flips; the returned handles let the caller await their exit.
    pub fn start_background_tasks(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            self.verification.start_cleanup_task(shutdown.clone()),
            self.reminders.start(shutdown),
        ]
    }

    /// Prepare the storage schema.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Check that storage is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }
}
