//! Registration, login, password reset, and account activation.
//!
//! Registration creates a disabled account; the account flips to enabled
//! only through [`AuthService::activate`], which callers invoke after a
//! successful email verification. This service never sends email itself;
//! code issuance and delivery are orchestrated at the boundary.

use crate::{
    Error, TokenService, User,
    error::AuthError,
    repositories::UserRepository,
    user::NewUser,
    validation::{validate_email, validate_name, validate_password, validate_username},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// A successful login: the signed token plus the authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Service for account lifecycle operations.
pub struct AuthService<U: UserRepository> {
    users: Arc<U>,
    tokens: Arc<TokenService>,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: Arc<U>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new account.
    ///
    /// Fails with [`AuthError::DuplicateIdentity`] when the username or
    /// email is already taken; both checks run before any mutation. The
    /// created user is disabled pending email verification, and no token
    /// is issued here.
    pub async fn register(&self, input: NewRegistration) -> Result<User, Error> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;
        if !input.first_name.is_empty() {
            validate_name(&input.first_name)?;
        }
        if !input.last_name.is_empty() {
            validate_name(&input.last_name)?;
        }

        if self.users.exists_by_username(&input.username).await? {
            tracing::warn!(username = %input.username, "Username is already taken");
            return Err(AuthError::DuplicateIdentity.into());
        }

        if self.users.exists_by_email(&input.email).await? {
            tracing::warn!(email = %input.email, "Email is already in use");
            return Err(AuthError::DuplicateIdentity.into());
        }

        let password_hash = Self::hash_password(&input.password);

        let new_user = NewUser::builder()
            .username(input.username)
            .email(input.email)
            .password_hash(password_hash)
            .first_name(input.first_name)
            .last_name(input.last_name)
            .enabled(false)
            .build()?;

        let user = self.users.create(new_user).await?;

        tracing::info!(
            user.id = %user.id,
            username = %user.username,
            "Registered new user pending email verification"
        );

        Ok(user)
    }

    /// Authenticate with a username or email plus password.
    ///
    /// A correct password against a disabled account fails with
    /// [`AuthError::AccountDisabled`], never with `InvalidCredentials`.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthSession, Error> {
        let user = self
            .users
            .find_by_username_or_email(username_or_email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !Self::verify_password(password, &user.password_hash) {
            tracing::warn!(username = %user.username, "Invalid password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.enabled {
            tracing::warn!(username = %user.username, "Login attempt on disabled account");
            return Err(AuthError::AccountDisabled.into());
        }

        let token = self.tokens.issue(&user.username)?;

        tracing::info!(username = %user.username, "User logged in");

        Ok(AuthSession { token, user })
    }

    /// Replace the password for the account registered under `email`.
    ///
    /// The caller is responsible for having consumed a password-reset code
    /// for this email first.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), Error> {
        validate_password(new_password)?;

        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.password_hash = Self::hash_password(new_password);
        user.updated_at = Utc::now();

        self.users.update(&user).await?;

        tracing::info!(username = %user.username, "Password reset");

        Ok(())
    }

    /// Enable the account registered under `email`.
    ///
    /// Called only after a successful email-verification code consumption.
    pub async fn activate(&self, email: &str) -> Result<User, Error> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.enabled = true;
        user.updated_at = Utc::now();

        let user = self.users.update(&user).await?;

        tracing::info!(username = %user.username, "User account activated");

        Ok(user)
    }

    /// Hash a password with argon2.
    fn hash_password(password: &str) -> String {
        password_auth::generate_hash(password)
    }

    /// Verify a password against a stored hash.
    fn verify_password(password: &str, hash: &str) -> bool {
        password_auth::verify_password(password, hash).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockUserRepository {
        users: Arc<Mutex<HashMap<String, User>>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, new_user: NewUser) -> Result<User, Error> {
            let now = Utc::now();
            let user = User {
                id: new_user.id,
                username: new_user.username,
                email: new_user.email,
                password_hash: new_user.password_hash,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                enabled: new_user.enabled,
                created_at: now,
                updated_at: now,
            };

            self.users
                .lock()
                .await
                .insert(user.id.to_string(), user.clone());
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.username == identifier || u.email == identifier)
                .cloned())
        }

        async fn exists_by_username(&self, username: &str) -> Result<bool, Error> {
            Ok(self.find_by_username(username).await?.is_some())
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, Error> {
            Ok(self.find_by_email(email).await?.is_some())
        }

        async fn update(&self, user: &User) -> Result<User, Error> {
            self.users
                .lock()
                .await
                .insert(user.id.to_string(), user.clone());
            Ok(user.clone())
        }
    }

    fn registration(username: &str, email: &str) -> NewRegistration {
        NewRegistration {
            username: username.to_string(),
            email: email.to_string(),
            password: "Secret1!pass".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
        }
    }

    fn test_service(users: Arc<MockUserRepository>) -> AuthService<MockUserRepository> {
        let tokens = Arc::new(TokenService::new(TokenConfig::new_hs256(
            b"test_secret_key_for_auth_service_tests".to_vec(),
        )));
        AuthService::new(users, tokens)
    }

    #[tokio::test]
    async fn test_register_creates_disabled_user_with_hashed_password() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users.clone());

        let user = service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(!user.enabled);
        assert_ne!(user.password_hash, "Secret1!pass");
        assert!(password_auth::verify_password("Secret1!pass", &user.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users.clone());

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = service
            .register(registration("alice", "other@example.com"))
            .await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::DuplicateIdentity))
        ));
        assert_eq!(users.users.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users.clone());

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = service
            .register(registration("bob", "alice@example.com"))
            .await;

        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::DuplicateIdentity))
        ));
        assert_eq!(users.users.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_before_mutation() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users.clone());

        let mut input = registration("alice", "alice@example.com");
        input.password = "weak".to_string();

        let result = service.register(input).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(users.users.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_login_after_activation() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users.clone());

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();
        service.activate("alice@example.com").await.unwrap();

        let session = service.login("alice", "Secret1!pass").await.unwrap();
        assert_eq!(session.user.username, "alice");
        assert!(!session.token.is_empty());

        // Login by email resolves the same account
        let session = service
            .login("alice@example.com", "Secret1!pass")
            .await
            .unwrap();
        assert_eq!(session.user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        let result = service.login("nobody", "Secret1!pass").await;
        assert!(matches!(result, Err(Error::Auth(AuthError::UserNotFound))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();
        service.activate("alice@example.com").await.unwrap();

        let result = service.login("alice", "wrong-password").await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_login_disabled_account_with_correct_password() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();

        // Correct password, account never activated
        let result = service.login("alice", "Secret1!pass").await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::AccountDisabled))
        ));
    }

    #[tokio::test]
    async fn test_reset_password_replaces_hash() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        service
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();
        service.activate("alice@example.com").await.unwrap();

        service
            .reset_password("alice@example.com", "NewSecret2!pass")
            .await
            .unwrap();

        assert!(service.login("alice", "NewSecret2!pass").await.is_ok());
        assert!(matches!(
            service.login("alice", "Secret1!pass").await,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_reset_password_unknown_email() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        let result = service
            .reset_password("nobody@example.com", "NewSecret2!pass")
            .await;
        assert!(matches!(result, Err(Error::Auth(AuthError::UserNotFound))));
    }

    #[tokio::test]
    async fn test_activate_unknown_email() {
        let users = Arc::new(MockUserRepository::default());
        let service = test_service(users);

        let result = service.activate("nobody@example.com").await;
        assert!(matches!(result, Err(Error::Auth(AuthError::UserNotFound))));
    }
}
