// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;

use crate::api::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{AuthService, AuthSession, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register - Create an account and sign it in
///
/// Requires `tosAccepted: true`; the accepted version is recorded with the account.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<AuthSession> {
    let session = AuthService::new(&state).register(request).await?;
    Ok(ApiResponse::created(session).message("Account created successfully"))
}
