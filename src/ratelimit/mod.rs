//! Sliding window rate limiting over a shared counter cache.

mod keys;
mod limiter;
mod window;

pub use keys::{bucket_keys, BucketKey, IntervalKeys, NAMESPACE};
pub use limiter::{limit, Decision, SlidingWindowLimiter};
pub use window::{sliding_window_allows, weighted_estimate};
