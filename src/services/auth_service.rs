use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::UserView;
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::{TokenKind, TokenPair, TokenService, TokenSubject};
use crate::database::models::{NewUser, User};
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{
    char_len, is_valid_email, is_valid_username, Validator, EMAIL_MESSAGE, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN,
    USERNAME_MESSAGE,
};

/// Shared by unknown-email and wrong-password failures
pub const INVALID_CREDENTIALS: &str = "Email or password is incorrect";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub tos_accepted: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// A user summary together with a freshly issued token pair
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

pub struct AuthService {
    users: UserRepository,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
    tos_version: String,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users(),
            tokens: state.tokens.clone(),
            bcrypt_cost: state.config.security.bcrypt_cost,
            tos_version: state.config.tos.current_version.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApiError> {
        let (username, email, password) = validate_registration(&request)?;

        if self.users.email_in_use(&email).await? {
            return Err(ApiError::conflict("An account with this email already exists"));
        }
        if self.users.username_in_use(&username).await? {
            return Err(ApiError::conflict("This username is already taken. Please choose another."));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                tos_version: self.tos_version.clone(),
            })
            .await?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(AuthSession {
            tokens: self.issue(&user)?,
            user: UserView::new(&user),
        })
    }

    /// Validates the login body and returns the normalized email for rate-limit keying
    pub fn login_email(request: &LoginRequest) -> Result<String, ApiError> {
        let mut v = Validator::new();
        let email = v.required("email", request.email.as_deref(), "Email is required");
        let password = v.required("password", request.password.as_deref(), "Password is required");
        if let Some(email) = email {
            v.check("email", is_valid_email(email.trim()), EMAIL_MESSAGE);
        }
        if let Some(password) = password {
            v.check("password", !password.is_empty(), "Password is required");
        }
        v.finish()?;
        Ok(email.unwrap_or_default().trim().to_lowercase())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError> {
        let email = Self::login_email(&request)?;
        let password = request.password.unwrap_or_default();

        let Some(user) = self.users.find_active_by_email(&email).await? else {
            verify_dummy(password, self.bcrypt_cost).await?;
            warn!("Login failed: no active account for {}", email);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            warn!("Login failed: wrong password for user {}", user.id);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        info!("User {} logged in", user.id);
        Ok(AuthSession {
            tokens: self.issue(&user)?,
            user: UserView::with_tos_status(&user, &self.tos_version),
        })
    }

    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, ApiError> {
        let token = request
            .refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::field("refreshToken", "Please provide a refresh token"))?;

        let claims = self.tokens.verify(token, TokenKind::Refresh).map_err(|e| {
            warn!("Refresh rejected: {}", e);
            ApiError::unauthorized("Refresh token is invalid or expired")
        })?;

        let user = self
            .users
            .find_active_by_id(claims.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User account no longer exists"))?;

        self.issue(&user)
    }

    pub async fn me(&self, user_id: i64) -> Result<UserView, ApiError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(UserView::with_tos_status(&user, &self.tos_version))
    }

    /// Record consent to the current Terms of Service version
    pub async fn accept_tos(&self, user_id: i64) -> Result<UserView, ApiError> {
        let user = self
            .users
            .accept_tos(user_id, &self.tos_version)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        info!("User {} accepted ToS version {}", user.id, self.tos_version);
        Ok(UserView::with_tos_status(&user, &self.tos_version))
    }

    fn issue(&self, user: &User) -> Result<TokenPair, ApiError> {
        Ok(self.tokens.issue(&TokenSubject {
            user_id: user.id,
            email: &user.email,
            username: &user.username,
        })?)
    }
}

/// Returns (username, lowercased email, password) when every field passes
fn validate_registration(request: &RegisterRequest) -> Result<(String, String, String), ApiError> {
    let mut v = Validator::new();

    let username = v.required("username", request.username.as_deref(), "Username is required");
    if let Some(username) = username {
        v.check("username", is_valid_username(username), USERNAME_MESSAGE);
    }

    let email = v.required("email", request.email.as_deref(), "Email is required");
    if let Some(email) = email {
        v.check("email", is_valid_email(email.trim()), EMAIL_MESSAGE);
    }

    let password = v.required("password", request.password.as_deref(), "Password is required");
    if let Some(password) = password {
        let len = char_len(password);
        v.check(
            "password",
            len >= PASSWORD_MIN_LEN,
            format!("Password must be at least {} characters", PASSWORD_MIN_LEN),
        );
        v.check(
            "password",
            len <= PASSWORD_MAX_LEN,
            format!("Password must be at most {} characters", PASSWORD_MAX_LEN),
        );
    }

    v.check(
        "tosAccepted",
        request.tos_accepted == Some(true),
        "You must accept the Terms of Service to register",
    );

    v.finish()?;
    Ok((
        username.unwrap_or_default().to_string(),
        email.unwrap_or_default().trim().to_lowercase(),
        password.unwrap_or_default().to_string(),
    ))
}
