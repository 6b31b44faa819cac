// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Invalid
//! values stop the service before it binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8092` |
//! | `GATEWAY_SERVICE_TOKEN` | Shared secret for service-to-service calls | unset (service calls disabled) |
//! | `PUBLIC_PATHS` | Comma-separated paths reachable without trust headers | `/health,/actuator` |
//! | `PROGRAM_SERVICE_URL` | Base URL of the Program service | `http://localhost:8093/service/program` |
//! | `PROGRAM_SERVICE_TIMEOUT_SECS` | Program service HTTP timeout | `10` |
//! | `PROGRAM_CACHE_TTL_SECS` | Program lookup cache TTL | `300` |
//! | `PROGRAM_CACHE_MAX_SIZE` | Program lookup cache capacity | `100` |
//! | `EMAIL_DOMAIN` | Required email suffix | `@unibague.edu.co` |
//! | `STRICT_EMAIL_VALIDATION` | Enforce `EMAIL_DOMAIN` | `true` |
//! | `PASSWORD_MIN_LENGTH` | Minimum password length | `8` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::ServiceToken;
use crate::validation::UserSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Shared secret expected in `X-Service-Token`.
///
/// Never logged. When unset, no request can be classified as a
/// service-to-service call.
pub const SERVICE_TOKEN_ENV: &str = "GATEWAY_SERVICE_TOKEN";

pub const PUBLIC_PATHS_ENV: &str = "PUBLIC_PATHS";
pub const PROGRAM_SERVICE_URL_ENV: &str = "PROGRAM_SERVICE_URL";
pub const PROGRAM_SERVICE_TIMEOUT_ENV: &str = "PROGRAM_SERVICE_TIMEOUT_SECS";
pub const PROGRAM_CACHE_TTL_ENV: &str = "PROGRAM_CACHE_TTL_SECS";
pub const PROGRAM_CACHE_MAX_SIZE_ENV: &str = "PROGRAM_CACHE_MAX_SIZE";
pub const EMAIL_DOMAIN_ENV: &str = "EMAIL_DOMAIN";
pub const STRICT_EMAIL_VALIDATION_ENV: &str = "STRICT_EMAIL_VALIDATION";
pub const PASSWORD_MIN_LENGTH_ENV: &str = "PASSWORD_MIN_LENGTH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8092;
const DEFAULT_PUBLIC_PATHS: &str = "/health,/actuator";
const DEFAULT_PROGRAM_SERVICE_URL: &str = "http://localhost:8093/service/program";
const DEFAULT_PROGRAM_SERVICE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROGRAM_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PROGRAM_CACHE_MAX_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Program service client settings.
#[derive(Debug, Clone)]
pub struct ProgramServiceConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_max_size: usize,
}

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub service_token: Option<ServiceToken>,
    pub public_paths: Vec<String>,
    pub program_service: ProgramServiceConfig,
    pub users: UserSettings,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip: IpAddr = host
            .parse()
            .map_err(|_| ConfigError::invalid(HOST_ENV, &host, "not an IP address"))?;
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let service_token = lookup(SERVICE_TOKEN_ENV).and_then(ServiceToken::new);

        let public_paths = get(PUBLIC_PATHS_ENV)
            .unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if let Some(bad) = public_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::invalid(
                PUBLIC_PATHS_ENV,
                bad,
                "paths must start with '/'",
            ));
        }

        let program_service = ProgramServiceConfig {
            base_url: parse_program_url(
                get(PROGRAM_SERVICE_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_PROGRAM_SERVICE_URL.to_string()),
            )?,
            timeout: Duration::from_secs(positive(
                get(PROGRAM_SERVICE_TIMEOUT_ENV),
                PROGRAM_SERVICE_TIMEOUT_ENV,
                DEFAULT_PROGRAM_SERVICE_TIMEOUT_SECS,
            )?),
            cache_ttl: Duration::from_secs(parse_or(
                get(PROGRAM_CACHE_TTL_ENV),
                PROGRAM_CACHE_TTL_ENV,
                DEFAULT_PROGRAM_CACHE_TTL_SECS,
            )?),
            cache_max_size: positive(
                get(PROGRAM_CACHE_MAX_SIZE_ENV),
                PROGRAM_CACHE_MAX_SIZE_ENV,
                DEFAULT_PROGRAM_CACHE_MAX_SIZE,
            )?,
        };

        let defaults = UserSettings::default();
        let users = UserSettings {
            email_domain: get(EMAIL_DOMAIN_ENV).unwrap_or(defaults.email_domain),
            strict_email_validation: parse_bool(
                get(STRICT_EMAIL_VALIDATION_ENV),
                STRICT_EMAIL_VALIDATION_ENV,
                defaults.strict_email_validation,
            )?,
            password_min_length: positive(
                get(PASSWORD_MIN_LENGTH_ENV),
                PASSWORD_MIN_LENGTH_ENV,
                defaults.password_min_length,
            )?,
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            None => LogFormat::default(),
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) => {
                return Err(ConfigError::invalid(
                    LOG_FORMAT_ENV,
                    &v,
                    "expected 'json' or 'pretty'",
                ))
            }
        };

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            service_token,
            public_paths,
            program_service,
            users,
            log_format,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::invalid(var, &raw, "not a valid number")),
    }
}

fn positive<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = parse_or(raw, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(raw: Option<String>, var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ConfigError::invalid(var, other, "expected true or false")),
    }
}

fn parse_program_url(raw: String) -> Result<Url, ConfigError> {
    let url = Url::parse(&raw)
        .map_err(|e| ConfigError::invalid(PROGRAM_SERVICE_URL_ENV, &raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            PROGRAM_SERVICE_URL_ENV,
            &raw,
            "scheme must be http or https",
        ));
    }
    Ok(url)
}
