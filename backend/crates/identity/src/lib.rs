//! Identity Backend Module
//!
//! Issues the authenticated principal the forum core trusts.
//!
//! Clean Architecture structure:
//! - `domain/` - User entity, value objects, repository trait
//! - `application/` - Register, login, profile and the principal token
//! - `infra/` - PostgreSQL and in-memory user stores
//! - `presentation/` - HTTP handlers, DTOs, router, principal middleware
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (optional application pepper)
//! - Stateless principal tokens signed with HMAC-SHA256
//! - Login failures are indistinguishable between unknown email and
//!   wrong password

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use infra::memory::MemoryUserStore;
pub use infra::postgres::PgUserStore;
pub use presentation::middleware::attach_principal;
pub use presentation::router::{identity_router, identity_router_generic};

#[cfg(test)]
mod tests;
