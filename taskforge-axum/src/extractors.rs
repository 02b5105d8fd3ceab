use axum::{
    Extension, RequestPartsExt,
    http::{StatusCode, request::Parts},
    extract::FromRequestParts,
};
use taskforge_core::User;

use crate::error::AuthError;

/// Extracts the authenticated user, rejecting with 401 when the request
/// carries no identity. Requires [`auth_middleware`](crate::auth_middleware)
/// upstream.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(user): Extension<User> =
            parts.extract().await.map_err(|_| AuthError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

/// Extracts the authenticated user if there is one.
pub struct OptionalAuthUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extract::<Option<Extension<Option<User>>>>()
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Extension error"))?
            .and_then(|Extension(user)| user);

        Ok(OptionalAuthUser(user))
    }
}
