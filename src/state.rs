use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{AccountRepository, NoteRepository, UserRepository};
use crate::middleware::RateLimits;

/// Shared per-process state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenService>,
    pub limits: Arc<RateLimits>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(&config.security)),
            limits: Arc::new(RateLimits::new(&config.rate_limit)),
            config: Arc::new(config),
            pool,
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn notes(&self) -> NoteRepository {
        NoteRepository::new(self.pool.clone())
    }

    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone())
    }
}
