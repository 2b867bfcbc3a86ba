use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{Claims, TokenError, TokenKind};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            username: claims.username,
        }
    }
}

/// Validates the bearer access token and injects `AuthUser` into the request
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let claims = state.tokens.verify(token, TokenKind::Access).map_err(|e| {
        warn!("Rejected access token: {}", e);
        match e {
            TokenError::Expired => ApiError::unauthorized("Your session has expired. Please log in again."),
            _ => ApiError::unauthorized("Invalid authentication token"),
        }
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::unauthorized("You must be logged in to access this resource");

    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(missing()),
    }
}
