//! Interval bucket key derivation.

use std::fmt;

/// Namespace segment shared by every rate limit bucket.
pub const NAMESPACE: &str = "rate_limits";
/// Separator between key segments on the wire.
const DELIMITER: char = ':';
/// Escape prefix for delimiter characters inside the identifier.
const ESCAPE: char = '\\';

/// A key that uniquely identifies one interval bucket of one identifier.
///
/// The key is rendered as `identifier:rate_limits:index`. Delimiters and
/// escape characters inside the identifier are backslash-escaped, so no two
/// distinct `(identifier, index)` pairs can render to the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    /// The rate limited entity
    pub identifier: String,
    /// Interval index, `floor(time / window)`
    pub index: i64,
}

impl BucketKey {
    /// Create a new bucket key.
    pub fn new(identifier: impl Into<String>, index: i64) -> Self {
        Self {
            identifier: identifier.into(),
            index,
        }
    }

    /// The key of the interval immediately before this one.
    pub fn previous(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            index: self.index - 1,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.identifier.chars() {
            if c == DELIMITER || c == ESCAPE {
                write!(f, "{}", ESCAPE)?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "{}{}{}{}", DELIMITER, NAMESPACE, DELIMITER, self.index)
    }
}

/// The pair of buckets consulted by one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalKeys {
    /// Bucket of the interval before `current`
    pub previous: BucketKey,
    /// Bucket containing the current time
    pub current: BucketKey,
}

/// Derive the previous and current bucket keys for `current_time`.
///
/// `window` must be positive; callers validate it before getting here.
pub fn bucket_keys(identifier: &str, current_time: i64, window: i64) -> IntervalKeys {
    let current = BucketKey::new(identifier, current_time / window);
    IntervalKeys {
        previous: current.previous(),
        current,
    }
}
