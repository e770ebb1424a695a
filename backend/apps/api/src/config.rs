//! Server Configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use identity::IdentityConfig;
use platform::crypto::from_base64;
use platform::rate_limit::RateLimitConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Process-level settings for the API binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub request_timeout: Duration,
    /// Per-IP budget for `/api`
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let request_timeout = Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 10)?);
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 5)?;

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: parse_or("RATE_LIMIT_MAX", defaults.max_requests)?,
            window: Duration::from_secs(parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )?),
        };
        if rate_limit.max_requests == 0 || rate_limit.window.is_zero() {
            bail!("RATE_LIMIT_MAX and RATE_LIMIT_WINDOW_SECS must be positive");
        }

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            frontend_origins,
            request_timeout,
            rate_limit,
        })
    }
}

/// Identity settings; the token secret is mandatory in release builds
pub fn identity_config_from_env() -> anyhow::Result<IdentityConfig> {
    let mut config = match env::var("IDENTITY_TOKEN_SECRET") {
        Ok(secret_b64) => {
            let secret_bytes =
                from_base64(secret_b64.trim()).context("IDENTITY_TOKEN_SECRET must be base64")?;
            let Ok(secret) = <[u8; 32]>::try_from(secret_bytes.as_slice()) else {
                bail!("IDENTITY_TOKEN_SECRET must decode to 32 bytes");
            };
            let base = if cfg!(debug_assertions) {
                IdentityConfig::development()
            } else {
                IdentityConfig::default()
            };
            IdentityConfig {
                token_secret: secret,
                ..base
            }
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("IDENTITY_TOKEN_SECRET not set, using a random development secret");
            IdentityConfig::development()
        }
        Err(_) => bail!("IDENTITY_TOKEN_SECRET must be set in production"),
    };

    if let Ok(pepper) = env::var("IDENTITY_PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    Ok(config)
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}
