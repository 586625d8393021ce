//! Cache command encoding.
//!
//! A command goes over the wire as a JSON array of tokens, the command name
//! first, e.g. `["INCR", "svc:rate_limits:3"]` or
//! `["EXPIRE", "svc:rate_limits:3", 10800]`.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde::Deserialize;

use crate::error::{LimiterError, Result};
use crate::ratelimit::BucketKey;

/// Confirmation token the cache returns for a successful `EXPIRE`.
const OK_REPLY: &str = "OK";

/// A single counter cache command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Increment a counter by one
    Incr(BucketKey),
    /// Read a counter
    Get(BucketKey),
    /// Set a counter's time-to-live in seconds
    Expire(BucketKey, u64),
}

impl Command {
    /// The command name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Incr(_) => "INCR",
            Command::Get(_) => "GET",
            Command::Expire(_, _) => "EXPIRE",
        }
    }

    /// The key this command targets.
    pub fn key(&self) -> &BucketKey {
        match self {
            Command::Incr(key) | Command::Get(key) | Command::Expire(key, _) => key,
        }
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = match self {
            Command::Expire(_, _) => 3,
            _ => 2,
        };

        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(self.name())?;
        seq.serialize_element(&self.key().to_string())?;
        if let Command::Expire(_, ttl) = self {
            seq.serialize_element(ttl)?;
        }
        seq.end()
    }
}

/// A decoded cache response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// A counter value
    Integer(i64),
    /// A status token such as `"OK"`
    Status(String),
    /// No value stored under the key
    Nil,
}

impl Reply {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Interpret the reply as a counter value that must be present.
    pub fn into_count(self) -> Result<i64> {
        match self {
            Reply::Integer(count) => Ok(count),
            Reply::Nil => Err(LimiterError::UnexpectedReply("null".to_string())),
            Reply::Status(other) => Err(LimiterError::UnexpectedReply(other)),
        }
    }

    /// Interpret the reply as a counter value, absent meaning zero.
    pub fn into_count_or_zero(self) -> Result<i64> {
        match self {
            Reply::Nil => Ok(0),
            other => other.into_count(),
        }
    }

    /// Interpret the reply as an `OK` confirmation.
    pub fn into_ok(self) -> Result<()> {
        match self {
            Reply::Status(status) if status == OK_REPLY => Ok(()),
            Reply::Status(other) => Err(LimiterError::UnexpectedReply(other)),
            Reply::Integer(value) => Err(LimiterError::UnexpectedReply(value.to_string())),
            Reply::Nil => Err(LimiterError::UnexpectedReply("null".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> BucketKey {
        BucketKey::new("svc", 3)
    }

    #[test]
    fn test_incr_encoding() {
        let encoded = serde_json::to_value(Command::Incr(key())).unwrap();
        assert_eq!(encoded, json!(["INCR", "svc:rate_limits:3"]));
    }

    #[test]
    fn test_get_encoding() {
        let encoded = serde_json::to_value(Command::Get(key())).unwrap();
        assert_eq!(encoded, json!(["GET", "svc:rate_limits:3"]));
    }

    #[test]
    fn test_expire_encoding() {
        let encoded = serde_json::to_value(Command::Expire(key(), 10800)).unwrap();
        assert_eq!(encoded, json!(["EXPIRE", "svc:rate_limits:3", 10800]));
    }

    #[test]
    fn test_reply_counts() {
        assert_eq!(Reply::from_slice(b"7").unwrap().into_count().unwrap(), 7);
        assert_eq!(Reply::from_slice(b"7").unwrap().into_count_or_zero().unwrap(), 7);
        assert_eq!(Reply::from_slice(b"null").unwrap().into_count_or_zero().unwrap(), 0);
        assert!(matches!(
            Reply::from_slice(b"\"OK\"").unwrap().into_count(),
            Err(LimiterError::UnexpectedReply(_))
        ));
        assert!(matches!(
            Reply::from_slice(b"\"OK\"").unwrap().into_count_or_zero(),
            Err(LimiterError::UnexpectedReply(_))
        ));
    }

    #[test]
    fn test_null_is_not_a_count_when_one_is_required() {
        let err = Reply::from_slice(b"null").unwrap().into_count().unwrap_err();
        assert!(matches!(err, LimiterError::UnexpectedReply(ref reply) if reply == "null"));
        assert!(err.is_protocol());
    }

    #[test]
    fn test_reply_ok() {
        assert!(Reply::from_slice(b"\"OK\"").unwrap().into_ok().is_ok());
        assert!(matches!(
            Reply::from_slice(b"\"ERR\"").unwrap().into_ok(),
            Err(LimiterError::UnexpectedReply(reply)) if reply == "ERR"
        ));
        assert!(Reply::from_slice(b"1").unwrap().into_ok().is_err());
    }

    #[test]
    fn test_reply_undecodable() {
        assert!(matches!(Reply::from_slice(b"{\"count\": 1}"), Err(LimiterError::Decode(_))));
        assert!(matches!(Reply::from_slice(b""), Err(LimiterError::Decode(_))));
    }
}
