// handlers/protected/auth/tos.rs - POST /api/auth/accept-tos handler

use axum::{extract::State, Extension};

use crate::api::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AuthService;
use crate::state::AppState;

/// POST /api/auth/accept-tos - Record acceptance of the current Terms of Service
pub async fn accept_tos_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserView> {
    let view = AuthService::new(&state).accept_tos(user.id).await?;
    Ok(ApiResponse::success(view).message("Terms of Service accepted"))
}
