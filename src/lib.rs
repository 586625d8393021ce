//! Cachelimit - Distributed Sliding Window Rate Limiting
//!
//! This crate decides whether a request for an identifier fits within a rate
//! limit over a sliding time window. Counters live in an external counter
//! cache rather than in process memory, so any number of stateless callers
//! sharing that cache enforce one limit together.

pub mod cache;
pub mod config;
pub mod error;
pub mod ratelimit;

pub use error::{LimiterError, Result};
pub use ratelimit::{limit, Decision, SlidingWindowLimiter};
