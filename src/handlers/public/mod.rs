// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration is limited per client IP; login keys its limit on IP and email
// inside the handler because the email is only known after the body parses.

pub mod auth;
