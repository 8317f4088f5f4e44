//! Task payloads.
//!
//! The queue stores opaque bytes. `Payload` covers the two ways a caller can
//! hand a task over: raw bytes (text included), stored unchanged, or a
//! structured JSON value that is encoded on the way in. Arbitrary
//! `Serialize` types go through `ReliableQueue::enqueue_json` instead.

use serde::Serialize;

use crate::error::{QueueError, QueueResult};

/// A task payload at the enqueue boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Bytes stored as-is.
    Raw(Vec<u8>),
    /// Structured value stored as its JSON encoding.
    Json(serde_json::Value),
}

impl Payload {
    /// Encodes a serializable value as a structured payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> QueueResult<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(QueueError::Serialization)
    }

    /// Returns the bytes that will be written to the store.
    pub fn into_bytes(self) -> QueueResult<Vec<u8>> {
        match self {
            Self::Raw(bytes) => Ok(bytes),
            Self::Json(value) => serde_json::to_vec(&value).map_err(QueueError::Serialization),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Raw(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Raw(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Raw(text.into_bytes())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Raw(text.as_bytes().to_vec())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_and_bytes_are_stored_unchanged() {
        assert_eq!(Payload::from("hello").into_bytes().unwrap(), b"hello");
        assert_eq!(
            Payload::from(String::from("{not json")).into_bytes().unwrap(),
            b"{not json"
        );
        assert_eq!(
            Payload::from(vec![0u8, 159, 146, 150]).into_bytes().unwrap(),
            vec![0u8, 159, 146, 150]
        );
        assert_eq!(Payload::from(b"raw").into_bytes().unwrap(), b"raw");
    }

    #[test]
    fn test_json_value_is_encoded() {
        let payload = Payload::from(json!({"id": 1, "name": "a"}));
        let bytes = payload.into_bytes().unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, json!({"id": 1, "name": "a"}));
    }

    #[test]
    fn test_json_string_is_quoted() {
        // A structured string differs from raw text: it gets JSON quotes.
        let bytes = Payload::json("hello").unwrap().into_bytes().unwrap();
        assert_eq!(bytes, b"\"hello\"");
    }

    #[test]
    fn test_unserializable_value_is_serialization_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let mut map = HashMap::new();
        map.insert(vec![1u8, 2], "value");

        let err = Payload::json(&map).expect_err("non-string keys cannot be encoded");
        assert!(matches!(err, QueueError::Serialization(_)));
    }
}
