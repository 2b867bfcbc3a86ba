pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{
    api_rate_limit, apply_rate_limit_headers, client_ip, delete_account_rate_limit, register_rate_limit, spawn_sweeper,
    ClientIp, RateLimits,
};
pub use response::{ApiResponse, ApiResult};
