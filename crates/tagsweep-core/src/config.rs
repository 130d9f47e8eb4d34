//! Sweep configuration.
//!
//! Everything is read from `HARBOR_*` environment variables. The CLI reads
//! the same variables through clap and assembles a [`SweepConfig`] with
//! [`SweepConfig::from_lookup`], so both paths share one set of rules.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Result, SweepError};
use crate::plan::{TagFilter, DEFAULT_EXCLUDE};

pub const ENV_REGISTRY: &str = "HARBOR_REGISTRY";
pub const ENV_USERNAME: &str = "HARBOR_USERNAME";
pub const ENV_PASSWORD: &str = "HARBOR_PASSWORD";
pub const ENV_PROJECTS: &str = "HARBOR_PROJECTS";
pub const ENV_TAGS: &str = "HARBOR_TAGS";
pub const ENV_EXCLUDE_TAGS: &str = "HARBOR_EXCLUDE_TAGS";
pub const ENV_INSECURE: &str = "HARBOR_INSECURE";
pub const ENV_TIMEOUT_SECS: &str = "HARBOR_TIMEOUT_SECS";
pub const ENV_FAIL_FAST: &str = "HARBOR_FAIL_FAST";

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Basic-auth credentials for the registry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the registry API.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL, e.g. `https://harbor.example.com`
    pub base_url: Url,
    pub credentials: Credentials,
    /// Skip TLS certificate verification
    pub insecure: bool,
    pub timeout: Duration,
}

impl RegistryConfig {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(RegistryConfig {
            base_url: parse_base_url(base_url)?,
            credentials: Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
            insecure: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Full configuration of one sweep run.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub registry: RegistryConfig,
    pub projects: Vec<String>,
    pub filter: TagFilter,
    /// Abort the whole sweep on the first listing failure
    pub fail_fast: bool,
}

impl SweepConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String> {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(SweepError::MissingConfig { var })
        };

        let registry = required(ENV_REGISTRY)?;
        let username = required(ENV_USERNAME)?;
        let password = required(ENV_PASSWORD)?;
        let projects = required(ENV_PROJECTS)?;
        let tags = required(ENV_TAGS)?;

        let projects = parse_list(ENV_PROJECTS, &projects)?;
        let include = parse_list(ENV_TAGS, &tags)?;
        let exclude = match lookup(ENV_EXCLUDE_TAGS) {
            Some(raw) => split_list(&raw),
            None => DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
        };

        let insecure = match lookup(ENV_INSECURE) {
            Some(raw) => parse_bool(ENV_INSECURE, &raw)?,
            None => false,
        };
        let fail_fast = match lookup(ENV_FAIL_FAST) {
            Some(raw) => parse_bool(ENV_FAIL_FAST, &raw)?,
            None => false,
        };
        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let registry = RegistryConfig::new(&registry, &username, &password)?
            .with_insecure(insecure)
            .with_timeout(timeout);

        Ok(SweepConfig {
            registry,
            projects,
            filter: TagFilter::new(include, exclude),
            fail_fast,
        })
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_list(var: &str, raw: &str) -> Result<Vec<String>> {
    let items = split_list(raw);
    if items.is_empty() {
        return Err(SweepError::InvalidConfig(format!(
            "{} has no non-empty entries",
            var
        )));
    }
    Ok(items)
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SweepError::InvalidConfig(format!(
            "{} must be a boolean, got '{}'",
            var, other
        ))),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(SweepError::InvalidConfig(format!(
            "{} must be a positive number of seconds, got '{}'",
            ENV_TIMEOUT_SECS, raw
        ))),
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SweepError::InvalidConfig(format!("invalid registry URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(SweepError::InvalidConfig(format!(
            "registry URL must be http or https, got '{}'",
            raw
        )));
    }
    Ok(url)
}
