//! Extractors that enforce authentication at the type level, so a handler
//! cannot accidentally skip the caller-identity check.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::models::UserId;

/// The authenticated caller, extracted from the JWT claims that the auth
/// middleware placed in the request extensions.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<UserId>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        Ok(User { id })
    }
}
