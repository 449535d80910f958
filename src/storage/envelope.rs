// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Dual-format value codec for the versioned store.
//!
//! Values written before the envelope format was introduced are raw bytes
//! with no timestamp ("legacy"). Every value written since is a JSON object
//! `{"value": <string>, "timestamp": <seconds-since-epoch-as-string>}`.
//! The two are told apart by the first byte: an envelope always starts with
//! the object-open marker `{`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{StoreError, StoreResult};

/// First byte of every envelope-encoded value.
const ENVELOPE_MARKER: u8 = b'{';

/// On-disk shape of a current-format value.
///
/// The timestamp is serialized as a decimal string, matching the format the
/// databases were originally written with.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: String,
    timestamp: String,
}

/// A decoded value, current or legacy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// The payload itself (key material, CSR body, status code, ...).
    pub value: String,
    /// Creation time in seconds since epoch. `None` for legacy values.
    pub timestamp: Option<i64>,
}

impl StoredValue {
    /// Whether this value predates the envelope format.
    pub fn is_legacy(&self) -> bool {
        self.timestamp.is_none()
    }

    /// Creation time as a UTC datetime, if this is a current-format value.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// Encode a value in the current format.
///
/// The timestamp is captured by the caller (the store, at write time), not
/// here; the codec performs no I/O and reads no clocks.
pub fn encode(value: &str, timestamp: i64) -> StoreResult<Vec<u8>> {
    let envelope = Envelope {
        value: value.to_string(),
        timestamp: timestamp.to_string(),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode raw store bytes into a [`StoredValue`].
///
/// Bytes starting with `{` must parse as a well-formed envelope; anything
/// else there is corruption, not a legacy value, and fails with
/// [`StoreError::CorruptValue`] rather than silently returning a default.
pub fn decode(bytes: &[u8]) -> StoreResult<StoredValue> {
    if bytes.first() == Some(&ENVELOPE_MARKER) {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::CorruptValue(format!("malformed envelope: {e}")))?;
        let timestamp: i64 = envelope.timestamp.parse().map_err(|_| {
            StoreError::CorruptValue(format!(
                "non-integer envelope timestamp: {:?}",
                envelope.timestamp
            ))
        })?;
        Ok(StoredValue {
            value: envelope.value,
            timestamp: Some(timestamp),
        })
    } else {
        let value = String::from_utf8(bytes.to_vec())
            .map_err(|_| StoreError::CorruptValue("legacy value is not valid UTF-8".into()))?;
        Ok(StoredValue {
            value,
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_envelope_with_marker() {
        let bytes = encode("secret-material", 1700000000).unwrap();
        assert_eq!(bytes[0], b'{');

        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["value"], "secret-material");
        assert_eq!(parsed["timestamp"], "1700000000");
    }

    #[test]
    fn decode_roundtrips_current_format() {
        let bytes = encode("0xdeadbeef", 1700000123).unwrap();
        let stored = decode(&bytes).unwrap();
        assert_eq!(stored.value, "0xdeadbeef");
        assert_eq!(stored.timestamp, Some(1700000123));
        assert!(!stored.is_legacy());
    }

    #[test]
    fn decode_treats_non_marker_bytes_as_legacy() {
        let stored = decode(b"plain old value").unwrap();
        assert_eq!(stored.value, "plain old value");
        assert_eq!(stored.timestamp, None);
        assert!(stored.is_legacy());
    }

    #[test]
    fn decode_rejects_malformed_envelope() {
        let err = decode(b"{not json at all").unwrap_err();
        assert!(matches!(err, StoreError::CorruptValue(_)));
    }

    #[test]
    fn decode_rejects_envelope_missing_fields() {
        let err = decode(br#"{"value":"x"}"#).unwrap_err();
        assert!(matches!(err, StoreError::CorruptValue(_)));
    }

    #[test]
    fn decode_rejects_non_integer_timestamp() {
        let err = decode(br#"{"value":"x","timestamp":"yesterday"}"#).unwrap_err();
        assert!(matches!(err, StoreError::CorruptValue(_)));
    }

    #[test]
    fn created_at_converts_to_datetime() {
        let stored = decode(&encode("v", 0).unwrap()).unwrap();
        assert_eq!(stored.created_at().unwrap().timestamp(), 0);

        let legacy = decode(b"raw").unwrap();
        assert!(legacy.created_at().is_none());
    }
}
