//! Sliding window rate limiter backed by a shared counter cache.

use tracing::{debug, error, instrument, trace, warn};

use super::keys::bucket_keys;
use super::window::{sliding_window_allows, weighted_estimate};
use crate::cache::{CounterCache, HttpCounterCache};
use crate::config::{CacheConfig, CacheLimitConfig, ExpiryPolicy, LimiterConfig};
use crate::error::{LimiterError, Result};

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Value of the current bucket after this attempt's increment
    pub current_count: i64,
}

impl Decision {
    fn allow(current_count: i64) -> Self {
        Self {
            allowed: true,
            current_count,
        }
    }

    fn deny(current_count: i64) -> Self {
        Self {
            allowed: false,
            current_count,
        }
    }
}

/// Rate limiter that keeps its counters in a [`CounterCache`].
///
/// The limiter holds no counts between calls, so any number of instances
/// pointed at the same cache share one view of every identifier.
pub struct SlidingWindowLimiter<C: CounterCache> {
    /// Where the interval counters live
    cache: C,
    /// Retention and expiry failure policy
    config: LimiterConfig,
}

impl<C: CounterCache> SlidingWindowLimiter<C> {
    /// Create a limiter with default settings.
    pub fn new(cache: C) -> Self {
        Self::with_config(cache, LimiterConfig::default())
    }

    /// Create a limiter with explicit settings.
    pub fn with_config(cache: C, config: LimiterConfig) -> Self {
        Self { cache, config }
    }

    /// Get the underlying counter cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Get the limiter settings.
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Check whether `identifier` may make another request at `current_time`.
    ///
    /// Every call that passes validation costs one increment of the current
    /// bucket, whether or not it is admitted. A denial is `Ok` with
    /// `allowed == false`. Errors are reserved for invalid arguments and cache
    /// failures, and nothing is retried.
    #[instrument(skip(self), level = "debug")]
    pub async fn limit(
        &self,
        identifier: &str,
        limit: i64,
        window: i64,
        current_time: i64,
    ) -> Result<Decision> {
        validate(identifier, limit, window, current_time)?;

        let keys = bucket_keys(identifier, current_time, window);

        let current_count = self.cache.increment(&keys.current).await.map_err(|e| {
            error!(key = %keys.current, error = %e, "Failed to increment bucket");
            e
        })?;

        if current_count >= limit {
            debug!(
                identifier = %identifier,
                count = current_count,
                limit = limit,
                "Current interval at limit"
            );
            return Ok(Decision::deny(current_count));
        }

        if let Err(e) = self.cache.expire(&keys.current, self.config.expiry_secs).await {
            match self.config.expiry_policy {
                ExpiryPolicy::Strict => {
                    error!(key = %keys.current, error = %e, "Failed to set bucket expiry");
                    return Err(e);
                }
                ExpiryPolicy::BestEffort => {
                    warn!(key = %keys.current, error = %e, "Failed to set bucket expiry, continuing");
                }
            }
        }

        let previous_count = self.cache.get(&keys.previous).await.map_err(|e| {
            error!(key = %keys.previous, error = %e, "Failed to read previous bucket");
            e
        })?;

        let allowed =
            sliding_window_allows(limit, window, previous_count, current_count, current_time);

        trace!(
            identifier = %identifier,
            previous = previous_count,
            current = current_count,
            estimated = ?weighted_estimate(limit, window, previous_count, current_count, current_time),
            allowed = allowed,
            "Sliding window evaluated"
        );

        if allowed {
            Ok(Decision::allow(current_count))
        } else {
            debug!(
                identifier = %identifier,
                previous = previous_count,
                current = current_count,
                limit = limit,
                "Sliding window limit exceeded"
            );
            Ok(Decision::deny(current_count))
        }
    }

    /// Same as [`limit`](Self::limit), at the current Unix time in seconds.
    pub async fn limit_now(&self, identifier: &str, limit: i64, window_secs: i64) -> Result<Decision> {
        self.limit(identifier, limit, window_secs, chrono::Utc::now().timestamp())
            .await
    }
}

impl SlidingWindowLimiter<HttpCounterCache> {
    /// Create a limiter talking to the cache described in `config`.
    pub fn from_config(config: &CacheLimitConfig) -> Result<Self> {
        let cache = HttpCounterCache::new(&config.cache)?;
        Ok(Self::with_config(cache, config.limiter.clone()))
    }
}

/// Run a single admission check against the cache at `cache_address`.
///
/// Returns `Ok(false)` when the identifier is over its limit.
///
/// Each call builds its own HTTP client and connection pool. Callers making
/// repeated checks should keep one limiter from
/// [`SlidingWindowLimiter::from_config`] and call
/// [`limit`](SlidingWindowLimiter::limit) on it instead.
pub async fn limit(
    cache_address: &str,
    identifier: &str,
    limit: i64,
    window: i64,
    current_time: i64,
) -> Result<bool> {
    let cache = HttpCounterCache::new(&CacheConfig::with_address(cache_address))?;
    let decision = SlidingWindowLimiter::new(cache)
        .limit(identifier, limit, window, current_time)
        .await?;
    Ok(decision.allowed)
}

fn validate(identifier: &str, limit: i64, window: i64, current_time: i64) -> Result<()> {
    if identifier.is_empty() {
        return Err(LimiterError::InvalidConfig("identifier must not be empty".to_string()));
    }
    if limit <= 0 {
        return Err(LimiterError::InvalidConfig(format!("limit must be positive, got {}", limit)));
    }
    if window <= 0 {
        return Err(LimiterError::InvalidConfig(format!("window must be positive, got {}", window)));
    }
    if current_time < 0 {
        return Err(LimiterError::InvalidConfig(format!(
            "current time must not be negative, got {}",
            current_time
        )));
    }
    Ok(())
}
