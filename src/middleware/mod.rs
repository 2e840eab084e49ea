pub mod auth;
pub mod response;

pub use auth::{session_middleware, SESSION_COOKIE};
pub use response::{ApiResponse, ApiResult};
