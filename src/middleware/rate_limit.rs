//! Fixed-window request counters keyed by client IP, user id or IP+email.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, Extensions, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, warn};

use super::auth::AuthUser;
use crate::config::{Quota, RateLimitConfig};
use crate::error::ApiError;
use crate::state::AppState;

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
const RATELIMIT_RESET: &str = "ratelimit-reset";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counter state after an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateStatus {
    pub fn reset_secs(&self) -> u64 {
        ceil_secs(self.reset_after)
    }
}

/// A rejected request and how long until its window reopens
#[derive(Debug, Clone)]
pub struct RateLimited {
    pub limiter: &'static str,
    pub message: &'static str,
    pub limit: u32,
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds until retry, rounded up so clients never retry early
    pub fn retry_after_secs(&self) -> u64 {
        ceil_secs(self.retry_after).max(1)
    }

    fn status(&self) -> RateStatus {
        RateStatus {
            limit: self.limit,
            remaining: 0,
            reset_after: Duration::from_secs(self.retry_after_secs()),
        }
    }
}

impl From<RateLimited> for ApiError {
    fn from(limited: RateLimited) -> Self {
        let secs = limited.retry_after_secs();
        ApiError::too_many_requests(limited.message, Some(secs))
    }
}

/// 429 body with Retry-After and the RateLimit-* headers
impl IntoResponse for RateLimited {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = ApiError::from(self).into_response();
        apply_rate_limit_headers(response.headers_mut(), &status);
        response
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

pub struct FixedWindowLimiter {
    name: &'static str,
    message: &'static str,
    quota: Quota,
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(name: &'static str, quota: Quota, message: &'static str) -> Self {
        Self {
            name,
            message,
            quota,
            windows: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str) -> Result<RateStatus, RateLimited> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<RateStatus, RateLimited> {
        let mut window = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        let mut elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.quota.window {
            window.started = now;
            window.count = 0;
            elapsed = Duration::ZERO;
        }
        let reset_after = self.quota.window - elapsed;

        if window.count >= self.quota.max {
            debug!("Rate limiter '{}' rejected key '{}'", self.name, key);
            return Err(RateLimited {
                limiter: self.name,
                message: self.message,
                limit: self.quota.max,
                retry_after: reset_after,
            });
        }

        window.count += 1;
        Ok(RateStatus {
            limit: self.quota.max,
            remaining: self.quota.max - window.count,
            reset_after,
        })
    }

    /// Drop windows that have fully elapsed; returns how many were removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        let window = self.quota.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// The limiters guarding auth, general API and account deletion routes
pub struct RateLimits {
    pub enabled: bool,
    pub login: FixedWindowLimiter,
    pub register: FixedWindowLimiter,
    pub api: FixedWindowLimiter,
    pub delete_account: FixedWindowLimiter,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            login: FixedWindowLimiter::new(
                "login",
                config.login,
                "Too many login attempts. Please try again in 15 minutes.",
            ),
            register: FixedWindowLimiter::new(
                "register",
                config.register,
                "Too many registration attempts. Please try again later.",
            ),
            api: FixedWindowLimiter::new("api", config.api, "API rate limit exceeded. Please slow down."),
            delete_account: FixedWindowLimiter::new(
                "delete_account",
                config.delete_account,
                "You can only attempt account deletion once per hour.",
            ),
        }
    }

    /// Check `limiter` unless rate limiting is switched off
    pub fn check(&self, limiter: &FixedWindowLimiter, key: &str) -> Result<Option<RateStatus>, RateLimited> {
        if !self.enabled {
            return Ok(None);
        }
        limiter.check(key).map(Some)
    }

    pub fn sweep(&self) -> usize {
        self.login.sweep() + self.register.sweep() + self.api.sweep() + self.delete_account.sweep()
    }
}

/// Periodically evict elapsed windows so idle keys do not accumulate
pub fn spawn_sweeper(limits: Arc<RateLimits>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = limits.sweep();
            if removed > 0 {
                debug!("Rate limiter sweep removed {} expired windows", removed);
            }
        }
    })
}

/// Best-effort client address: socket peer first, then X-Forwarded-For
pub fn client_ip(extensions: &Extensions, headers: &HeaderMap) -> String {
    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    forwarded_for(headers).unwrap_or_else(|| "unknown".to_string())
}

fn request_ip(request: &Request) -> String {
    client_ip(request.extensions(), request.headers())
}

/// Extractor form of [`client_ip`] for handlers that key limits themselves
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.extensions, &parts.headers)))
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn enforce(
    limits: &RateLimits,
    limiter: &FixedWindowLimiter,
    key: String,
    request: Request,
    next: Next,
) -> Response {
    match limits.check(limiter, &key) {
        Ok(status) => {
            let mut response = next.run(request).await;
            if let Some(status) = status {
                apply_rate_limit_headers(response.headers_mut(), &status);
            }
            response
        }
        Err(limited) => {
            warn!("Rate limit '{}' exceeded for key '{}'", limited.limiter, key);
            limited.into_response()
        }
    }
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, status: &RateStatus) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(status.reset_secs()));
}

/// Registration: keyed by client IP
pub async fn register_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request_ip(&request);
    enforce(&state.limits, &state.limits.register, key, request, next).await
}

/// General API: keyed by user id when authenticated, otherwise client IP
pub async fn api_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = match request.extensions().get::<AuthUser>() {
        Some(user) => format!("user:{}", user.id),
        None => request_ip(&request),
    };
    enforce(&state.limits, &state.limits.api, key, request, next).await
}

/// Account deletion: keyed by user id
pub async fn delete_account_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = match request.extensions().get::<AuthUser>() {
        Some(user) => format!("user:{}", user.id),
        None => request_ip(&request),
    };
    enforce(&state.limits, &state.limits.delete_account, key, request, next).await
}
