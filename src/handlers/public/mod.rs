// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Routes: /, /health, /api/auth/login, /api/auth/register

pub mod auth;
pub mod system;

pub use auth::{login, register};
pub use system::{health, root};
