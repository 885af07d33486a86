//! Runtime configuration.
//!
//! Both services are configured through environment variables with
//! defaults suitable for a single-host setup.
//!
//! | Variable | Default | Used by |
//! |----------|---------|---------|
//! | `SEARCH_BIND` | `0.0.0.0:9567` | search service |
//! | `SEARCH_ENGINE_URL` | `http://localhost:9200` | search service (`memory://` for the in-process engine) |
//! | `ELASTIC_USERNAME` / `ELASTIC_PASSWORD` | unset | search service |
//! | `ELASTIC_VERIFY_CERTS` | `false` | search service |
//! | `INDEX_NAME` | `documents` | search service |
//! | `RETRY_INTERVAL_SECS` | `5` | search service |
//! | `RETRY_MAX_INTERVAL_SECS` | retry interval | search service |
//! | `RETRY_MAX_ATTEMPTS` | `12` (`0` = forever) | search service |
//! | `RETRY_JITTER_MS` | `0` | search service |
//! | `ENGINE_TIMEOUT_MS` | `10000` | search service |
//! | `PROXY_BIND` | `0.0.0.0:8000` | proxy |
//! | `BACKEND_URL` | `http://localhost:9567` | proxy |
//! | `BACKEND_TIMEOUT_MS` | `10000` | proxy |
//! | `PROXY_LEGACY_STATUS` | `false` | proxy |
//!
//! Timeouts must be positive. Retry intervals are capped at one day and
//! jitter at one minute.

use crate::engine::connection::RetryPolicy;
use crate::engine::elastic::{ElasticConfig, ElasticCredentials, ElasticEngine};
use crate::engine::memory::MemoryEngine;
use crate::engine::types::{EngineError, SearchEngine};

use anyhow::{Context, Result};
use std::fmt::Display;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const MEMORY_ENGINE_URL: &str = "memory://";

const TIMEOUT_MS_RANGE: RangeInclusive<u64> = 1..=86_400_000;
const INTERVAL_SECS_RANGE: RangeInclusive<u64> = 0..=86_400;
const JITTER_MS_RANGE: RangeInclusive<u64> = 0..=60_000;

/// Which engine the search service talks to.
#[derive(Debug, Clone)]
pub enum EngineTarget {
    Elastic(ElasticConfig),
    Memory,
}

impl EngineTarget {
    pub fn build(&self) -> Result<Arc<dyn SearchEngine>, EngineError> {
        match self {
            EngineTarget::Elastic(config) => Ok(Arc::new(ElasticEngine::new(config)?)),
            EngineTarget::Memory => Ok(Arc::new(MemoryEngine::new())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub bind: SocketAddr,
    pub engine: EngineTarget,
    pub index_name: String,
    pub retry: RetryPolicy,
    pub engine_timeout: Duration,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = parse_or(&lookup, "SEARCH_BIND", "0.0.0.0:9567".parse::<SocketAddr>()?)?;
        let engine_timeout = Duration::from_millis(parse_in_range(
            &lookup,
            "ENGINE_TIMEOUT_MS",
            10_000,
            TIMEOUT_MS_RANGE,
        )?);

        let interval_secs = parse_in_range(&lookup, "RETRY_INTERVAL_SECS", 5, INTERVAL_SECS_RANGE)?;
        let interval = Duration::from_secs(interval_secs);
        let max_interval = Duration::from_secs(parse_in_range(
            &lookup,
            "RETRY_MAX_INTERVAL_SECS",
            interval_secs,
            INTERVAL_SECS_RANGE,
        )?);
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", 12u32)?,
            interval,
            max_interval,
            multiplier: if max_interval > interval { 2.0 } else { 1.0 },
            jitter_ms: parse_in_range(&lookup, "RETRY_JITTER_MS", 0, JITTER_MS_RANGE)?,
        };

        let url = lookup("SEARCH_ENGINE_URL").unwrap_or_else(|| "http://localhost:9200".to_string());
        let engine = if url.trim() == MEMORY_ENGINE_URL {
            EngineTarget::Memory
        } else {
            let credentials = match (lookup("ELASTIC_USERNAME"), lookup("ELASTIC_PASSWORD")) {
                (Some(username), Some(password)) => Some(ElasticCredentials { username, password }),
                (Some(_), None) | (None, Some(_)) => {
                    anyhow::bail!("ELASTIC_USERNAME and ELASTIC_PASSWORD must be set together")
                }
                (None, None) => None,
            };
            EngineTarget::Elastic(ElasticConfig {
                url: url.trim().to_string(),
                credentials,
                verify_certs: parse_or(&lookup, "ELASTIC_VERIFY_CERTS", false)?,
                timeout: engine_timeout,
            })
        };

        let index_name = lookup("INDEX_NAME").unwrap_or_else(|| "documents".to_string());
        if index_name.trim().is_empty() {
            anyhow::bail!("INDEX_NAME must not be empty");
        }

        Ok(Self {
            bind,
            engine,
            index_name,
            retry,
            engine_timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    pub backend_url: String,
    pub backend_timeout: Duration,
    /// Answer backend failures with `200 OK` instead of `502 Bad Gateway`.
    pub legacy_status: bool,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_url = lookup("BACKEND_URL").unwrap_or_else(|| "http://localhost:9567".to_string());

        Ok(Self {
            bind: parse_or(&lookup, "PROXY_BIND", "0.0.0.0:8000".parse::<SocketAddr>()?)?,
            backend_url: normalize_url(&backend_url),
            backend_timeout: Duration::from_millis(parse_in_range(
                &lookup,
                "BACKEND_TIMEOUT_MS",
                10_000,
                TIMEOUT_MS_RANGE,
            )?),
            legacy_status: parse_or(&lookup, "PROXY_LEGACY_STATUS", false)?,
        })
    }
}

/// Adds a scheme when missing and strips trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    normalized.trim_end_matches('/').to_string()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn parse_in_range<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T>
where
    T: FromStr + PartialOrd + Display,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let value = parse_or(lookup, name, default)?;
    if !range.contains(&value) {
        anyhow::bail!(
            "invalid value for {}: {} (expected {}..={})",
            name,
            value,
            range.start(),
            range.end()
        );
    }
    Ok(value)
}
