// handlers/protected/account/delete.rs - DELETE /api/account handler

use axum::{body::Bytes, extract::State, Extension};

use crate::api::optional_json;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::account_service::{DeleteAccountRequest, DeletionSummary};
use crate::services::AccountService;
use crate::state::AppState;

/// DELETE /api/account - Erase the caller's account
///
/// Body `{"deleteNotes": bool}` is optional; notes are deleted by default and
/// anonymized when `deleteNotes` is false. Limited to one attempt per hour.
pub async fn account_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<DeletionSummary> {
    let request: DeleteAccountRequest = optional_json(&body)?;
    let summary = AccountService::new(&state).delete(user.id, request).await?;
    Ok(ApiResponse::success(summary).message("Account deleted successfully"))
}
