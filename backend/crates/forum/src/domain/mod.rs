//! Domain Layer
//!
//! Entities, value objects, repository traits and pure rules.

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
