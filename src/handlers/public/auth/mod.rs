// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require a bearer token.

pub mod login;    // POST /api/auth/login
pub mod refresh;  // POST /api/auth/refresh
pub mod register; // POST /api/auth/register

pub use login::login_post;
pub use refresh::refresh_post;
pub use register::register_post;
