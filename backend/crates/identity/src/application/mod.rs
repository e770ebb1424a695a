//! Application Layer
//!
//! Use cases for the identity edge.

pub mod config;
pub mod login;
pub mod me;
pub mod principal_token;
pub mod register;

pub use login::{LoginInput, LoginUseCase};
pub use me::MeUseCase;
pub use register::{RegisterInput, RegisterUseCase};
