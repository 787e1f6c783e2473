use axum::extract::State;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::UserId;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject - the profile id of the caller
    pub exp: i64,    // expiration time (unix timestamp)
}

/// Validate JWT signature and extract claims (HS256)
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Middleware to extract JWT and add the caller id to extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, AppError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    // Verify JWT and extract claims
    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }

    // Add caller id to request extensions
    req.extensions_mut().insert(UserId::new(claims.sub));

    Ok(next.run(req).await)
}
