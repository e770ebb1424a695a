//! Principal Token
//!
//! Stateless bearer credential:
//! `<user uuid>.<expires_at_ms>.<base64url(HMAC-SHA256(secret, "<uuid>.<expires_at_ms>"))>`
//!
//! The signature is checked in constant time before the expiry, so a
//! forged token never reveals whether its timestamp would have passed.

use chrono::Utc;
use kernel::id::UserId;
use platform::crypto::{constant_time_eq, from_base64_url, hmac_sha256, to_base64_url};
use uuid::Uuid;

use crate::application::config::IdentityConfig;
use crate::error::{IdentityError, IdentityResult};

/// Freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at_ms: i64,
}

/// Sign a token for `user_id` valid for the configured TTL
pub fn issue(config: &IdentityConfig, user_id: UserId) -> IssuedToken {
    issue_at(config, user_id, Utc::now().timestamp_millis())
}

/// Verify a token and return the principal id it names
pub fn verify(config: &IdentityConfig, token: &str) -> IdentityResult<UserId> {
    verify_at(config, token, Utc::now().timestamp_millis())
}

fn issue_at(config: &IdentityConfig, user_id: UserId, now_ms: i64) -> IssuedToken {
    let expires_at_ms = now_ms + config.token_ttl_ms();
    let payload = format!("{}.{}", user_id, expires_at_ms);
    let signature = hmac_sha256(&config.token_secret, payload.as_bytes());

    IssuedToken {
        token: format!("{}.{}", payload, to_base64_url(&signature)),
        expires_at_ms,
    }
}

fn verify_at(config: &IdentityConfig, token: &str, now_ms: i64) -> IdentityResult<UserId> {
    let (payload, signature) = token
        .rsplit_once('.')
        .ok_or(IdentityError::InvalidToken)?;
    let (user_part, expires_part) = payload
        .split_once('.')
        .ok_or(IdentityError::InvalidToken)?;

    let provided = from_base64_url(signature).map_err(|_| IdentityError::InvalidToken)?;
    let expected = hmac_sha256(&config.token_secret, payload.as_bytes());
    if !constant_time_eq(&provided, &expected) {
        return Err(IdentityError::InvalidToken);
    }

    let expires_at_ms: i64 = expires_part
        .parse()
        .map_err(|_| IdentityError::InvalidToken)?;
    if expires_at_ms <= now_ms {
        return Err(IdentityError::InvalidToken);
    }

    let uuid = Uuid::parse_str(user_part).map_err(|_| IdentityError::InvalidToken)?;
    Ok(UserId::from_uuid(uuid))
}
