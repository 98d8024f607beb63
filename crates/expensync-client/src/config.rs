//! Base URL resolution and client tuning knobs.
//!
//! # Design
//! - Resolution runs once, at construction, in a fixed priority order:
//!   explicit override, then loopback for local hosts, then the hosted backend.
//! - Environment access goes through a lookup closure so resolution stays pure
//!   and testable without mutating process state.

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Path segment every versioned endpoint lives under.
pub const API_VERSION_SUFFIX: &str = "/api/v1";
/// Base URL used when the client runs on a local development host.
pub const LOCAL_BASE_URL: &str = "http://localhost:5000/api/v1";
/// Hosted backend used when nothing else applies.
pub const PRODUCTION_BASE_URL: &str =
    "https://expense-tracker-visiualizer-backend.onrender.com/api/v1";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable holding the base URL override.
pub const ENV_API_URL: &str = "EXPENSYNC_API_URL";
/// Environment variable naming the host the client runs on.
pub const ENV_HOST: &str = "EXPENSYNC_HOST";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "EXPENSYNC_HTTP_TIMEOUT_SECS";
/// Environment variable toggling shared refresh for concurrent 401s.
pub const ENV_COALESCE_REFRESH: &str = "EXPENSYNC_COALESCE_REFRESH";

/// Errors raised while resolving client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured URL could not be parsed.
    #[error("invalid URL '{value}'")]
    InvalidUrl {
        /// Offending input.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },
    /// A numeric or boolean setting could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidSetting {
        /// Setting name.
        key: &'static str,
        /// Offending input.
        value: String,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolve the versioned API base URL.
///
/// An override is normalised so it ends in [`API_VERSION_SUFFIX`] exactly once.
/// Without an override, a local `host` selects [`LOCAL_BASE_URL`]; anything
/// else selects [`PRODUCTION_BASE_URL`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] when the override is not a valid URL.
pub fn resolve_base_url(override_url: Option<&str>, host: Option<&str>) -> ConfigResult<Url> {
    if let Some(raw) = override_url.map(str::trim).filter(|value| !value.is_empty()) {
        return parse_url(&normalize_override(raw));
    }
    if host.is_some_and(is_local_host) {
        return parse_url(LOCAL_BASE_URL);
    }
    parse_url(PRODUCTION_BASE_URL)
}

fn normalize_override(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.ends_with(API_VERSION_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_VERSION_SUFFIX}")
    }
}

fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|addr| addr.is_loopback())
}

fn parse_url(value: &str) -> ConfigResult<Url> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
    coalesce_refresh: bool,
}

impl ClientConfig {
    /// Build a configuration around an already-resolved versioned base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            coalesce_refresh: true,
        }
    }

    /// Resolve configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but malformed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let base_url = resolve_base_url(
            lookup(ENV_API_URL).as_deref(),
            lookup(ENV_HOST).as_deref(),
        )?;
        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSetting {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_COALESCE_REFRESH) {
            config.coalesce_refresh = parse_flag(&raw).ok_or(ConfigError::InvalidSetting {
                key: ENV_COALESCE_REFRESH,
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Choose whether concurrent 401s share one refresh call.
    #[must_use]
    pub fn with_coalesce_refresh(mut self, coalesce: bool) -> Self {
        self.coalesce_refresh = coalesce;
        self
    }

    /// Versioned API base URL (ends in `/api/v1`).
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout applied by the HTTP transport.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether concurrent 401s share one refresh call.
    #[must_use]
    pub const fn coalesce_refresh(&self) -> bool {
        self.coalesce_refresh
    }

    /// Service root: the base URL with the version suffix removed.
    #[must_use]
    pub fn service_root(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        base.strip_suffix(API_VERSION_SUFFIX)
            .unwrap_or(base)
            .to_string()
    }

    /// URL for a versioned endpoint; an empty `path` yields the liveness root.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined URL is invalid.
    pub fn api_url(&self, path: &str) -> ConfigResult<Url> {
        join(self.base_url.as_str(), path)
    }

    /// Liveness check URL: the service root plus the version suffix.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined URL is invalid.
    pub fn liveness_url(&self) -> ConfigResult<Url> {
        join(&self.service_root(), API_VERSION_SUFFIX)
    }

    /// URL for an unversioned AI endpoint under `{root}/api/ai/`.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined URL is invalid.
    pub fn ai_url(&self, path: &str) -> ConfigResult<Url> {
        join(&format!("{}/api/ai", self.service_root()), path)
    }
}

fn join(base: &str, path: &str) -> ConfigResult<Url> {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        parse_url(base)
    } else {
        parse_url(&format!("{base}/{path}"))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
