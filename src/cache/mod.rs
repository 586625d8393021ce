//! Counter cache clients.
//!
//! The limiter keeps no counts of its own. Every admission check talks to a
//! shared counter cache that provides atomic increment, read and expiry, and
//! all cross-process coordination happens there.

mod command;
mod http;
mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::ratelimit::BucketKey;

pub use command::{Command, Reply};
pub use http::HttpCounterCache;
pub use memory::MemoryCounterCache;

/// Trait for counter cache implementations.
///
/// This trait abstracts over the remote HTTP cache and the in-process
/// [`MemoryCounterCache`] so the limiter can work with either. Each method is
/// a single round trip and is never retried.
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Atomically add one to the counter and return the new value.
    ///
    /// A missing counter is created at zero first, so the first call returns 1.
    async fn increment(&self, key: &BucketKey) -> Result<i64>;

    /// Read the counter, treating a missing key as zero.
    async fn get(&self, key: &BucketKey) -> Result<i64>;

    /// Set or refresh the time-to-live on the counter.
    async fn expire(&self, key: &BucketKey, ttl_secs: u64) -> Result<()>;
}

#[async_trait]
impl<C: CounterCache + ?Sized> CounterCache for std::sync::Arc<C> {
    async fn increment(&self, key: &BucketKey) -> Result<i64> {
        (**self).increment(key).await
    }

    async fn get(&self, key: &BucketKey) -> Result<i64> {
        (**self).get(key).await
    }

    async fn expire(&self, key: &BucketKey, ttl_secs: u64) -> Result<()> {
        (**self).expire(key, ttl_secs).await
    }
}
