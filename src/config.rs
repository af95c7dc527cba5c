// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup and validated
//! before the server binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | Shared secret for signing bearer tokens | Required |
//! | `TOKEN_TTL_SECS` | Bearer token lifetime | `604800` (7 days) |
//! | `RATE_LIMIT_WINDOW_SECS` | Auth endpoint rate-limit window | `900` (15 min) |
//! | `RATE_LIMIT_MAX_REQUESTS` | Requests per client per window | `5` |
//! | `LOOKUP_TIMEOUT_MS` | Upper bound on a user/resource lookup | `5000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD` | Bootstrap admin account | None |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::auth::middleware::DEFAULT_LOOKUP_TIMEOUT;
use crate::auth::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
use crate::auth::token::DEFAULT_TOKEN_TTL;
use crate::auth::RateLimitConfig;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const RATE_LIMIT_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
pub const RATE_LIMIT_MAX_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const LOOKUP_TIMEOUT_ENV: &str = "LOOKUP_TIMEOUT_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_PORT: u16 = 8080;

/// Startup configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Validated service settings.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    pub lookup_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("rate_limit", &self.rate_limit)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl AuthSettings {
    /// Settings with defaults everywhere except the secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            rate_limit: RateLimitConfig {
                window: DEFAULT_WINDOW,
                max_requests: DEFAULT_MAX_REQUESTS,
            },
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let mut settings = Self::with_secret(secret);

        if let Some(secs) = parse_var::<u64, _>(&lookup, TOKEN_TTL_ENV)? {
            settings.token_ttl = positive_secs(TOKEN_TTL_ENV, secs)?;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, RATE_LIMIT_WINDOW_ENV)? {
            settings.rate_limit.window = positive_secs(RATE_LIMIT_WINDOW_ENV, secs)?;
        }
        if let Some(max) = parse_var::<u32, _>(&lookup, RATE_LIMIT_MAX_ENV)? {
            if max == 0 {
                return Err(invalid(RATE_LIMIT_MAX_ENV, "0", "must be at least 1"));
            }
            settings.rate_limit.max_requests = max;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, LOOKUP_TIMEOUT_ENV)? {
            if ms == 0 {
                return Err(invalid(LOOKUP_TIMEOUT_ENV, "0", "must be at least 1"));
            }
            settings.lookup_timeout = Duration::from_millis(ms);
        }

        let host = match lookup(HOST_ENV) {
            Some(host) => IpAddr::from_str(&host)
                .map_err(|e| invalid(HOST_ENV, &host, &e.to_string()))?,
            None => settings.bind_addr.ip(),
        };
        let port = parse_var::<u16, _>(&lookup, PORT_ENV)?.unwrap_or(DEFAULT_PORT);
        settings.bind_addr = SocketAddr::new(host, port);

        Ok(settings)
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(var, &raw, &e.to_string())),
    }
}

fn positive_secs(var: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(invalid(var, "0", "must be at least 1"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn secret_is_required() {
        let err = AuthSettings::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(JWT_SECRET_ENV));

        let err = AuthSettings::from_lookup(lookup_from(&[(JWT_SECRET_ENV, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(JWT_SECRET_ENV));
    }

    #[test]
    fn defaults_apply() {
        let settings = AuthSettings::from_lookup(lookup_from(&[(JWT_SECRET_ENV, "s3cret")])).unwrap();
        assert_eq!(settings.token_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(settings.rate_limit.window, Duration::from_secs(15 * 60));
        assert_eq!(settings.rate_limit.max_requests, 5);
        assert_eq!(settings.lookup_timeout, Duration::from_secs(5));
        assert_eq!(settings.bind_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = AuthSettings::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (TOKEN_TTL_ENV, "3600"),
            (RATE_LIMIT_WINDOW_ENV, "60"),
            (RATE_LIMIT_MAX_ENV, "10"),
            (LOOKUP_TIMEOUT_ENV, "250"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
        ]))
        .unwrap();

        assert_eq!(settings.token_ttl, Duration::from_secs(3600));
        assert_eq!(settings.rate_limit.window, Duration::from_secs(60));
        assert_eq!(settings.rate_limit.max_requests, 10);
        assert_eq!(settings.lookup_timeout, Duration::from_millis(250));
        assert_eq!(settings.bind_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = AuthSettings::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (TOKEN_TTL_ENV, "a week"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: TOKEN_TTL_ENV, .. }));

        let err = AuthSettings::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (RATE_LIMIT_MAX_ENV, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: RATE_LIMIT_MAX_ENV, .. }));
    }

    #[test]
    fn debug_redacts_secret() {
        let settings = AuthSettings::with_secret("super-secret-value");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret-value"));
    }
}
