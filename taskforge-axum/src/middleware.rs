use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskforge::Taskforge;
use taskforge_core::{User, repositories::RepositoryProvider};

use crate::error::AuthError;

/// Shared state for the authentication middleware.
pub struct AuthState<R: RepositoryProvider> {
    pub taskforge: Arc<Taskforge<R>>,
    /// Requests whose path starts with this prefix skip token processing
    /// entirely; the auth endpoints themselves live under it.
    pub public_prefix: String,
}

impl<R: RepositoryProvider> AuthState<R> {
    pub fn new(taskforge: Arc<Taskforge<R>>) -> Self {
        Self {
            taskforge,
            public_prefix: "/api/auth/".to_string(),
        }
    }

    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            taskforge: self.taskforge.clone(),
            public_prefix: self.public_prefix.clone(),
        }
    }
}

/// Fail-open request authenticator.
///
/// Attaches the authenticated [`User`] to the request extensions when the
/// bearer token validates and its subject resolves to an existing user. On
/// any failure - missing header, bad token, unknown user, storage error -
/// the request proceeds without identity; rejecting is the job of
/// [`require_auth`] or the [`AuthUser`](crate::AuthUser) extractor on the
/// routes that need it.
pub async fn auth_middleware<R>(
    State(state): State<AuthState<R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    request.extensions_mut().insert(None::<User>);

    if request.uri().path().starts_with(&state.public_prefix) {
        return next.run(request).await;
    }

    if let Some(token) = extract_bearer_token(&request) {
        match state.taskforge.authenticate_token(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(user.clone());
                request.extensions_mut().insert(Some(user));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected, proceeding unauthenticated");
            }
        }
    }

    next.run(request).await
}

/// Fail-closed guard for routes that require identity.
pub async fn require_auth<R>(
    State(state): State<AuthState<R>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: RepositoryProvider,
{
    let token = extract_bearer_token(&request).ok_or(AuthError::Unauthorized)?;

    state
        .taskforge
        .authenticate_token(&token)
        .await
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}
