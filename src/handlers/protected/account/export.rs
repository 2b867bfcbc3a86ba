// handlers/protected/account/export.rs - GET /api/account/export handler

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::account_service::export_filename;
use crate::services::AccountService;
use crate::state::AppState;

/// GET /api/account/export - Download everything stored about the caller
///
/// Served as a raw JSON document (no success envelope) with an attachment
/// Content-Disposition.
pub async fn export_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let document = AccountService::new(&state).export(user.id).await?;
    let disposition = export_filename(document.export_date);

    let mut response = Json(document).into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
