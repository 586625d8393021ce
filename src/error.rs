//! Error types for cachelimit.

use thiserror::Error;

/// Main error type for rate limiting operations.
///
/// A denied request is not an error: it is reported as an allowed=false
/// [`Decision`](crate::ratelimit::Decision). Every variant here means the
/// limiter could not reach a decision at all.
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Limit, window, time or identifier outside the accepted range
    #[error("Invalid limiter configuration: {0}")]
    InvalidConfig(String),

    /// Network failure or timeout talking to the counter cache
    #[error("Counter cache transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The counter cache answered with a non-success status
    #[error("Counter cache returned status {0}")]
    Status(u16),

    /// The counter cache answered with a body of the wrong type
    #[error("Counter cache response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// The counter cache answered with an unexpected confirmation token
    #[error("Counter cache returned unexpected reply: {0}")]
    UnexpectedReply(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LimiterError {
    /// Whether the counter cache could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, LimiterError::Transport(_))
    }

    /// Whether the counter cache was reached but answered incorrectly.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            LimiterError::Status(_) | LimiterError::Decode(_) | LimiterError::UnexpectedReply(_)
        )
    }
}

impl From<config::ConfigError> for LimiterError {
    fn from(err: config::ConfigError) -> Self {
        LimiterError::Config(err.to_string())
    }
}

/// Result type alias for cachelimit operations.
pub type Result<T> = std::result::Result<T, LimiterError>;
