// handlers/protected/mod.rs - Protected handlers (credentials required)
//
// Security Level: bearer token or X-API-KEY, resolved by `middleware::require_auth`
// Route Prefix: /api/*
//
// The resolved `AuthUser` is available to every handler as a request
// extension.

pub mod auth;
pub mod crud;
pub mod teachers;

pub use auth::whoami;
