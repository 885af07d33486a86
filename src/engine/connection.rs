//! Engine Connection
//!
//! Produces a usable handle to the search engine, tolerating the engine
//! being temporarily unreachable (for example still starting up next to us).
//!
//! ## Lifecycle
//! The connection has two states. `Disconnected` is simply the absence of an
//! [`EngineConnection`] value; [`EngineConnection::connect`] only returns once a
//! liveness check has succeeded, so every value is `Connected` and stays so
//! for the process lifetime. A later engine outage is not detected here:
//! individual calls fail and the request that made them reports it.
//!
//! ## Policies
//! - **Retry**: `connect` and `ensure_index` retry under a [`RetryPolicy`]
//!   (bounded by default, fixed or growing interval).
//! - **Timeout**: every call made through the connection is bounded by a
//!   per-call timeout and fails with [`EngineError::Timeout`].

use super::types::{EngineError, IndexSchema, SearchEngine};

use rand::Rng;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retry schedule for connection establishment and index bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts before giving up. `0` retries forever.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub interval: Duration,
    /// Upper bound for the delay when `multiplier > 1`.
    pub max_interval: Duration,
    /// Growth factor applied to the delay after each failure.
    pub multiplier: f64,
    /// Random extra delay in `[0, jitter_ms]` added to each sleep.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(5),
            multiplier: 1.0,
            jitter_ms: 0,
        }
    }
}

impl RetryPolicy {
    /// Fixed-interval policy.
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            max_interval: interval,
            multiplier: 1.0,
            jitter_ms: 0,
        }
    }

    /// Delay to sleep after the given (1-based) failed attempt, before jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let scaled = self.interval.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let cap = self.max_interval.max(self.interval);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(Duration::MAX)
            .min(cap)
    }

    /// Whether `attempt` (1-based) was the last one allowed.
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts != 0 && attempt >= self.max_attempts
    }

    /// Delay actually slept after `attempt`: [`delay_for`](Self::delay_for)
    /// plus a random `0..=jitter_ms` milliseconds.
    pub fn sleep_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        self.delay_for(attempt)
            .saturating_add(Duration::from_millis(jitter))
    }
}

/// Process-wide handle to the search engine.
pub struct EngineConnection {
    engine: Arc<dyn SearchEngine>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl EngineConnection {
    /// Pings the engine until it answers, sleeping between attempts.
    ///
    /// # Returns
    /// * `Ok(connection)` after the first successful ping.
    /// * `Err(EngineError::ConnectionUnavailable)` once the policy is exhausted.
    pub async fn connect(
        engine: Arc<dyn SearchEngine>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        tracing::info!("Connecting to search engine");

        let attempts = retry_with(&retry, "search engine ping", || {
            with_timeout(timeout, engine.ping())
        })
        .await
        .map_err(|(attempts, last_error)| EngineError::ConnectionUnavailable {
            attempts,
            last_error: last_error.to_string(),
        })?
        .1;

        tracing::info!("Connected to search engine after {} attempt(s)", attempts);

        Ok(Self {
            engine,
            retry,
            timeout,
        })
    }

    /// Creates `index` with `schema` unless it already exists.
    ///
    /// Safe to call on every startup; an existing index is left untouched.
    pub async fn ensure_index(&self, index: &str, schema: &IndexSchema) -> Result<(), EngineError> {
        let engine = self.engine.as_ref();
        let timeout = self.timeout;

        retry_with(&self.retry, "index bootstrap", move || async move {
            if with_timeout(timeout, engine.index_exists(index)).await? {
                tracing::debug!("Index {} already exists", index);
                return Ok(());
            }
            with_timeout(timeout, engine.create_index(index, schema)).await?;
            tracing::info!("Created index: {}", index);
            Ok::<(), EngineError>(())
        })
        .await
        .map(|_| ())
        .map_err(|(attempts, last_error)| EngineError::IndexBootstrap {
            index: index.to_string(),
            attempts,
            last_error: last_error.to_string(),
        })
    }

    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn ping(&self) -> Result<(), EngineError> {
        with_timeout(self.timeout, self.engine.ping()).await
    }

    pub async fn count(&self, index: &str) -> Result<u64, EngineError> {
        with_timeout(self.timeout, self.engine.count(index)).await
    }

    pub async fn create_document(
        &self,
        index: &str,
        id: &str,
        source: Value,
    ) -> Result<(), EngineError> {
        with_timeout(self.timeout, self.engine.create_document(index, id, source)).await
    }

    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, EngineError> {
        with_timeout(self.timeout, self.engine.get_document(index, id)).await
    }

    pub async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, EngineError> {
        with_timeout(self.timeout, self.engine.search(index, body)).await
    }
}

/// Bounds a single engine call.
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(timeout)),
    }
}

/// Runs `op` until it succeeds or the policy is exhausted.
///
/// Returns the value and the attempt it succeeded on, or the number of
/// attempts made and the last error.
async fn retry_with<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<(T, u32), (u32, EngineError)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) => {
                if policy.exhausted(attempt) {
                    tracing::error!("{} failed after {} attempt(s): {}", what, attempt, e);
                    return Err((attempt, e));
                }

                let delay = policy.sleep_for(attempt);
                tracing::warn!(
                    "{} failed (attempt {}): {}. Retrying in {:?}",
                    what,
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
