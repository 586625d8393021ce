//! HTTP counter cache client.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, trace};

use super::command::{Command, Reply};
use super::CounterCache;
use crate::config::CacheConfig;
use crate::error::{LimiterError, Result};
use crate::ratelimit::BucketKey;

/// Counter cache reached by POSTing JSON commands to a single address.
#[derive(Debug, Clone)]
pub struct HttpCounterCache {
    /// URL every command is sent to
    address: String,
    /// Shared connection pool
    client: reqwest::Client,
}

impl HttpCounterCache {
    /// Create a client for the configured cache.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LimiterError::Config(format!("Failed to build cache client: {}", e)))?;

        Ok(Self::with_client(config.address.clone(), client))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(address: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            address: address.into(),
            client,
        }
    }

    /// The cache address commands are sent to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one command and decode the reply body.
    async fn execute(&self, command: &Command) -> Result<Reply> {
        trace!(
            address = %self.address,
            command = command.name(),
            key = %command.key(),
            "Sending cache command"
        );

        let response = self
            .client
            .post(&self.address)
            .json(command)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(
                address = %self.address,
                command = command.name(),
                status = status.as_u16(),
                "Cache command failed"
            );
            return Err(LimiterError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Reply::from_slice(&bytes)
    }
}

#[async_trait]
impl CounterCache for HttpCounterCache {
    async fn increment(&self, key: &BucketKey) -> Result<i64> {
        self.execute(&Command::Incr(key.clone())).await?.into_count()
    }

    async fn get(&self, key: &BucketKey) -> Result<i64> {
        self.execute(&Command::Get(key.clone())).await?.into_count_or_zero()
    }

    async fn expire(&self, key: &BucketKey, ttl_secs: u64) -> Result<()> {
        self.execute(&Command::Expire(key.clone(), ttl_secs)).await?.into_ok()
    }
}
