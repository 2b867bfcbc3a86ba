// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::{extract::State, Extension};

use crate::api::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AuthService;
use crate::state::AppState;

/// GET /api/auth/me - Current user, including whether the ToS needs re-acceptance
pub async fn me_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserView> {
    let view = AuthService::new(&state).me(user.id).await?;
    Ok(ApiResponse::success(view))
}
