//! Application Layer - Use Cases
//!
//! Each workflow is a sequence of individually atomic store calls; no
//! use case relies on a transaction spanning documents.

pub mod accept_solution;
pub mod add_comment;
pub mod config;
pub mod create_problem;
pub mod members;
pub mod query_problems;
pub mod submit_solution;
pub mod toggle_upvote;
pub mod update_problem;
