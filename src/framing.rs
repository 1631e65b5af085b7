//! Wire framing: delimiter-terminated JSON records.
//!
//! Every stream carries a sequence of records separated by a single
//! literal `'\n'` byte. `data` is encoded as a base64 string rather than
//! a raw JSON byte array so it can never contain the delimiter byte
//! unescaped.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Record delimiter byte terminating every framed record.
pub const DELIMITER: u8 = b'\n';

/// The reserved topic literal carrying error payloads.
pub const ERROR_TOPIC: &str = crate::config::ERROR_TOPIC;

/// One framed message: a literal topic paired with opaque payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Event {
    pub fn new(topic: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            data: data.into(),
        }
    }

    /// Wraps an [`ErrorPayload`] as an `Event` on the reserved error topic.
    pub fn error(payload: &ErrorPayload) -> Result<Self, FramingError> {
        let bytes = serde_json::to_vec(payload).map_err(FramingError::Encode)?;
        Ok(Self::new(ERROR_TOPIC, bytes))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        BASE64.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        BASE64.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// `{code, data}` payload carried as the `data` of an `Event` on topic `"error"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: i32,
    pub data: HashMap<String, Value>,
}

impl ErrorPayload {
    pub fn new(code: i32, data: HashMap<String, Value>) -> Self {
        Self { code, data }
    }

    pub fn with_topic(code: i32, topic: &str) -> Self {
        let mut data = HashMap::new();
        data.insert("topic".to_string(), Value::String(topic.to_string()));
        Self::new(code, data)
    }
}

/// Application-level error close codes, reused verbatim from the wire
/// protocol table.
pub mod codes {
    pub const NOT_AUTHORIZED: i32 = 1;
    pub const TOPIC_NOT_AVAILABLE: i32 = 2;
    pub const FAILED_TO_CREATE_STREAM: i32 = 3;
    pub const FAILED_TO_SEND_OFFER: i32 = 4;
    pub const UNKNOWN: i32 = 5;
}

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to write record: {0}")]
    Write(#[source] std::io::Error),
}

/// Serializes `event`, writes it, then writes the delimiter byte. A
/// failure at any step aborts the write and is reported to the caller.
pub async fn write_event<W: AsyncWrite + Unpin>(writer: &mut W, event: &Event) -> Result<(), FramingError> {
    let bytes = serde_json::to_vec(event).map_err(FramingError::Encode)?;
    writer.write_all(&bytes).await.map_err(FramingError::Write)?;
    writer.write_all(&[DELIMITER]).await.map_err(FramingError::Write)?;
    Ok(())
}

/// Decodes one delimited record (delimiter already stripped by the caller).
pub fn decode_event(bytes: &[u8]) -> Result<Event, FramingError> {
    serde_json::from_slice(bytes).map_err(FramingError::Decode)
}
