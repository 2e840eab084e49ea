// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no session) → Protected (session required, role checked per action)

pub mod public;
pub mod protected;
