pub mod auth;
pub mod extract;
pub mod json;
pub mod response;

pub use auth::{ensure_admin, require_auth, API_KEY_HEADER};
pub use extract::{PathParam, QueryParams};
pub use json::Payload;
pub use response::{ApiResponse, ApiResult, Collection};
