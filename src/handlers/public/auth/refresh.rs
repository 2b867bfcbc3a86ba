// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::extract::State;

use crate::api::ApiJson;
use crate::auth::TokenPair;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{AuthService, RefreshRequest};
use crate::state::AppState;

/// POST /api/auth/refresh - Trade a refresh token for a new token pair
pub async fn refresh_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let tokens = AuthService::new(&state).refresh(request).await?;
    Ok(ApiResponse::success(tokens).message("Token refreshed successfully"))
}
