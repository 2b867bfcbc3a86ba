// handlers/protected/account/profile.rs - PATCH /api/account/profile handler

use axum::{extract::State, Extension};

use crate::api::{ApiJson, ProfileView};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::account_service::ProfileRequest;
use crate::services::AccountService;
use crate::state::AppState;

/// PATCH /api/account/profile - Change username and/or email
pub async fn profile_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> ApiResult<ProfileView> {
    let profile = AccountService::new(&state).update_profile(user.id, request).await?;
    Ok(ApiResponse::success(profile).message("Profile updated successfully"))
}
