//! Sliding window counter evaluation.
//!
//! The true request count over the trailing window is approximated from two
//! fixed buckets: the whole current bucket, plus the previous bucket scaled by
//! how much of it still overlaps the trailing window. With `elapsed` the
//! position inside the current interval:
//!
//! ```text
//! estimated = floor(previous * (window - elapsed) / window) + current
//! ```
//!
//! Both counts are clamped to the limit first, so one very busy interval
//! cannot keep an identifier locked out for longer than a window.

/// Estimate the number of requests in the trailing window.
///
/// Returns `None` for a non-positive limit or window. The estimate saturates
/// at `i64::MAX`, which is never below any limit.
pub fn weighted_estimate(
    limit: i64,
    window: i64,
    previous_count: i64,
    current_count: i64,
    current_time: i64,
) -> Option<i64> {
    if limit <= 0 || window <= 0 {
        return None;
    }

    let previous = previous_count.clamp(0, limit) as i128;
    let current = current_count.clamp(0, limit);
    let remaining = (window - current_time.rem_euclid(window)) as i128;

    // remaining <= window, so the scaled value never exceeds `previous`.
    let carried = (previous * remaining / window as i128) as i64;
    Some(carried.saturating_add(current))
}

/// Decide whether a request fits in the sliding window.
///
/// A non-positive limit or window always denies, as does a current bucket
/// that is already over the limit.
pub fn sliding_window_allows(
    limit: i64,
    window: i64,
    previous_count: i64,
    current_count: i64,
    current_time: i64,
) -> bool {
    if current_count > limit {
        return false;
    }

    match weighted_estimate(limit, window, previous_count, current_count, current_time) {
        Some(estimated) => estimated < limit,
        None => false,
    }
}
