// handlers/protected/mod.rs - Protected handlers (bearer access token required)
//
// Every route here runs behind jwt_auth_middleware, which injects `AuthUser`,
// followed by the per-user API rate limit.

pub mod account; // /api/account/*
pub mod auth;    // /api/auth/me, /api/auth/accept-tos
pub mod notes;   // /api/notes[/:id]
