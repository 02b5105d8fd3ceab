//! Notification dispatch.
//!
//! Composes the plain-text bodies for verification, password-reset, and
//! reminder mail and hands them to the configured transport. Two delivery
//! modes: `send_*` awaits the transport and surfaces failures to the
//! caller; `dispatch_*` detaches the send so the calling request never
//! blocks on, or fails because of, email delivery.

use crate::{AppConfig, Error};
use std::sync::Arc;
use taskforge_mailer::{Email, Mailer, MailerConfig};

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    app_name: String,
    code_expiry_minutes: i64,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, mailer_config: &MailerConfig, config: &AppConfig) -> Self {
        Self {
            mailer,
            from_address: mailer_config.get_from_address(),
            app_name: mailer_config.app_name.clone(),
            code_expiry_minutes: config.code_expiry.num_minutes(),
        }
    }

    /// Send an email-verification code, awaiting delivery.
    pub async fn send_verification_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), Error> {
        let email = Email::builder()
            .from(&self.from_address)
            .to(to)
            .subject(format!("Verify Your Email - {}", self.app_name))
            .body(self.verification_body(username, code))
            .build()
            .map_err(Error::Mail)?;

        self.mailer.send_email(email).await?;

        tracing::info!(to = to, "Verification email sent");
        Ok(())
    }

    /// Send a password-reset code, awaiting delivery.
    ///
    /// The reset flow wants delivery confirmed before responding, so this
    /// path is always synchronous.
    pub async fn send_password_reset_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> Result<(), Error> {
        let email = Email::builder()
            .from(&self.from_address)
            .to(to)
            .subject(format!("Password Reset - {}", self.app_name))
            .body(self.password_reset_body(username, code))
            .build()
            .map_err(Error::Mail)?;

        self.mailer.send_email(email).await?;

        tracing::info!(to = to, "Password reset email sent");
        Ok(())
    }

    /// Send a due-item reminder, awaiting delivery.
    pub async fn send_todo_reminder(
        &self,
        to: &str,
        username: &str,
        title: &str,
        due: &str,
    ) -> Result<(), Error> {
        let email = Email::builder()
            .from(&self.from_address)
            .to(to)
            .subject(format!("Todo Reminder - {title}"))
            .body(self.reminder_body(username, title, due))
            .build()
            .map_err(Error::Mail)?;

        self.mailer.send_email(email).await?;

        tracing::info!(to = to, title = title, "Reminder email sent");
        Ok(())
    }

    /// Send an email-verification code without making the caller wait.
    ///
    /// Delivery failures are logged and never reach the caller; the code
    /// is already persisted, so support can always fall back to resending.
    pub fn dispatch_verification_code(
        &self,
        to: &str,
        username: &str,
        code: &str,
    ) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        let to = to.to_string();
        let username = username.to_string();
        let code = code.to_string();

        tokio::spawn(async move {
            if let Err(e) = notifier
                .send_verification_code(&to, &username, &code)
                .await
            {
                tracing::error!(to = %to, error = %e, "Failed to send verification email");
            }
        })
    }

    fn verification_body(&self, username: &str, code: &str) -> String {
        format!(
            "Hello {username},\n\n\
             Welcome to {app}! Please verify your email address by entering the following code:\n\n\
             Verification Code: {code}\n\n\
             This code will expire in {expiry} minutes.\n\n\
             If you didn't create an account with us, please ignore this email.\n\n\
             Best regards,\n\
             The {app} Team\n",
            app = self.app_name,
            expiry = self.code_expiry_minutes,
        )
    }

    fn password_reset_body(&self, username: &str, code: &str) -> String {
        format!(
            "Hello {username},\n\n\
             You requested a password reset for your {app} account.\n\n\
             Reset Code: {code}\n\n\
             This code will expire in {expiry} minutes.\n\n\
             If you didn't request this password reset, please ignore this email.\n\n\
             Best regards,\n\
             The {app} Team\n",
            app = self.app_name,
            expiry = self.code_expiry_minutes,
        )
    }

    fn reminder_body(&self, username: &str, title: &str, due: &str) -> String {
        format!(
            "Hello {username},\n\n\
             This is a friendly reminder that you have an item due soon:\n\n\
             Todo: {title}\n\
             Due: {due}\n\n\
             Don't forget to complete it on time!\n\n\
             Best regards,\n\
             The {app} Team\n",
            app = self.app_name,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use taskforge_mailer::MailerError;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: std::sync::Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_email(&self, email: Email) -> Result<(), MailerError> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    /// Fails every send.
    pub(crate) struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_email(&self, _email: Email) -> Result<(), MailerError> {
            Err(MailerError::Config("transport unavailable".to_string()))
        }
    }

    fn test_notifier(mailer: Arc<dyn Mailer>) -> Arc<Notifier> {
        Arc::new(Notifier::new(
            mailer,
            &MailerConfig::default(),
            &AppConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_verification_email_contents() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = test_notifier(mailer.clone());

        notifier
            .send_verification_code("alice@example.com", "alice", "123456")
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Verify Your Email - Taskforge");
        assert!(sent[0].body.contains("Hello alice"));
        assert!(sent[0].body.contains("Verification Code: 123456"));
        assert!(sent[0].body.contains("expire in 15 minutes"));
    }

    #[tokio::test]
    async fn test_password_reset_email_contents() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = test_notifier(mailer.clone());

        notifier
            .send_password_reset_code("alice@example.com", "alice", "654321")
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Password Reset - Taskforge");
        assert!(sent[0].body.contains("Reset Code: 654321"));
    }

    #[tokio::test]
    async fn test_reminder_email_contents() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = test_notifier(mailer.clone());

        notifier
            .send_todo_reminder("alice@example.com", "alice", "Buy milk", "Jan 5, 2026 at 9:00 AM")
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Todo Reminder - Buy milk");
        assert!(sent[0].body.contains("Todo: Buy milk"));
        assert!(sent[0].body.contains("Due: Jan 5, 2026 at 9:00 AM"));
    }

    #[tokio::test]
    async fn test_synchronous_send_surfaces_failure() {
        let notifier = test_notifier(Arc::new(FailingMailer));

        let result = notifier
            .send_password_reset_code("alice@example.com", "alice", "654321")
            .await;

        assert!(matches!(result, Err(Error::Mail(_))));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let notifier = test_notifier(Arc::new(FailingMailer));

        let handle = notifier.dispatch_verification_code("alice@example.com", "alice", "123456");

        // The spawned task finishes cleanly even though delivery failed
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_delivers() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = test_notifier(mailer.clone());

        let handle = notifier.dispatch_verification_code("alice@example.com", "alice", "123456");
        handle.await.unwrap();

        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }
}
