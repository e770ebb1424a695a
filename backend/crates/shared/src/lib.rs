//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the vocabulary every domain crate agrees on:
//! - The unified error model (`AppError`, `ErrorKind`, `AppResult`)
//! - Typed entity IDs (`ProblemId`, `SolutionId`, `UserId`)
//! - The authenticated `Principal` handed over by the identity edge
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
