//! Forum Backend Module
//!
//! Problems, solutions, upvotes, comments and solution acceptance.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, ownership rule
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers
//!
//! ## Consistency Model
//! - Every store call is atomic on one document; workflows are sequences
//!   of such calls, never multi-document transactions
//! - An upvote set and its counter change in one store call, so the count
//!   cannot drift under concurrent toggles
//! - Counters never go below zero; a write that would is rejected
//! - At most one accepted solution per problem, enforced by a conditional
//!   write (and a partial unique index in PostgreSQL)
//! - Ownership is checked before any write of a guarded workflow

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::ForumConfig;
pub use error::{ForumError, ForumResult};
pub use infra::memory::MemoryForumStore;
pub use infra::postgres::PgForumStore;
pub use presentation::router::{forum_router, forum_router_generic};

#[cfg(test)]
mod tests;
