//! # Service Configuration
//!
//! Loaded from environment variables at startup.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PORT` | `8080` | HTTP listen port |
//! | `JWT_SECRET` | required | HMAC secret for bearer tokens |
//! | `JWT_EXPIRES_IN_SECS` | `604800` | lifetime of issued tokens |
//! | `DATABASE_URL` | unset | PostgreSQL URL; unset means in-memory store |
//! | `DB_CONNECT_RETRIES` | `5` | connect attempts before giving up |
//! | `DB_RETRY_DELAY_MS` | `2000` | fixed delay between attempts |
//! | `LOG_FORMAT` | `pretty` | `pretty` or `json` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::db::RetryPolicy;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Configuration errors. Never echo secret values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("{var} has an invalid value: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// HMAC signing secret, zeroed on drop.
#[derive(Clone)]
pub struct JwtSecret(Zeroizing<String>);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret([REDACTED])")
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Runtime configuration for the API process.
///
/// Custom `Debug` redacts the secret and the database URL (which may carry
/// a password).
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: JwtSecret,
    pub token_ttl: chrono::Duration,
    pub database_url: Option<String>,
    pub db_retry: RetryPolicy,
    pub log_format: LogFormat,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret)
            .field("token_ttl", &self.token_ttl)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("db_retry", &self.db_retry)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .map(JwtSecret::new)
            .ok_or(ConfigError::MissingSecret)?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let ttl_secs: i64 = parse_or(&lookup, "JWT_EXPIRES_IN_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let token_ttl = chrono::Duration::try_seconds(ttl_secs)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::InvalidValue {
                var: "JWT_EXPIRES_IN_SECS",
                value: ttl_secs.to_string(),
            })?;

        let defaults = RetryPolicy::default();
        let max_attempts: u32 = parse_or(&lookup, "DB_CONNECT_RETRIES", defaults.max_attempts)?;
        let delay_ms: u64 = parse_or(
            &lookup,
            "DB_RETRY_DELAY_MS",
            defaults.delay.as_millis() as u64,
        )?;

        let log_format = match lookup("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|()| ConfigError::InvalidValue {
                var: "LOG_FORMAT",
                value: raw,
            })?,
        };

        Ok(Self {
            port,
            jwt_secret,
            token_ttl,
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            db_retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                delay: Duration::from_millis(delay_ms),
                ..defaults
            },
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}
