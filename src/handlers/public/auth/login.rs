// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::api::ApiJson;
use crate::middleware::{apply_rate_limit_headers, ApiResponse, ClientIp};
use crate::services::auth_service::{AuthService, LoginRequest};
use crate::state::AppState;

/// POST /api/auth/login - Exchange email and password for a token pair
///
/// Attempts are limited per client IP and email. Unknown email and wrong
/// password produce the same 401 body.
pub async fn login_post(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, Response> {
    let email = AuthService::login_email(&request).map_err(IntoResponse::into_response)?;
    let status = state
        .limits
        .check(&state.limits.login, &format!("{}-{}", ip, email))
        .map_err(IntoResponse::into_response)?;

    let mut response = AuthService::new(&state)
        .login(request)
        .await
        .map(|session| ApiResponse::success(session).message("Login successful"))
        .into_response();
    if let Some(status) = status {
        apply_rate_limit_headers(response.headers_mut(), &status);
    }
    Ok(response)
}
