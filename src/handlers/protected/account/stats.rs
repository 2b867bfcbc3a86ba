// handlers/protected/account/stats.rs - GET /api/account/stats handler

use axum::{extract::State, Extension};

use crate::api::StatsView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;
use crate::state::AppState;

pub async fn stats_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<StatsView> {
    let stats = AccountService::new(&state).stats(user.id).await?;
    Ok(ApiResponse::success(stats))
}
