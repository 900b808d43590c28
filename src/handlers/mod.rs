// handlers/mod.rs - Two-tier handler layout
//
// Public (no credentials) → Protected (bearer token or API key)
//
// Admin-only operations live in the protected tier and check the resolved
// identity themselves with `middleware::ensure_admin`.
pub mod public;    // Tier 1: service info, health, login and registration
pub mod protected; // Tier 2: entity CRUD, teacher relations, whoami
