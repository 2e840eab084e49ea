// handlers/public/mod.rs - Public handlers (no session required)
//
// Route Prefix: none (/, /health, /auth/*)

pub mod auth;
pub mod system;
