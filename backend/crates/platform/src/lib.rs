//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256, Base64, constant-time compare)
//! - Password hashing (Argon2id) for stored credential secrets
//! - Credential extraction from HTTP requests (bearer header, cookie)
//! - Fixed-window rate limiting per client key

pub mod crypto;
pub mod http_auth;
pub mod password;
pub mod rate_limit;
