//! Validation pipeline for inbound text frames.
//!
//! Three gates, each short-circuiting on failure:
//!
//! | Gate | Checks | Failure |
//! |------|--------|---------|
//! | Structure | frame parses as one JSON value | [`ValidationError::MalformedPayload`] |
//! | Envelope | object with known `type` and string `requestId` | [`ValidationError::SchemaViolation`] at `type` / `requestId` |
//! | Payload | `data` matches the schema for `type` | [`ValidationError::SchemaViolation`] under `data` |
//!
//! Failures are values, never panics. [`ValidationError::to_frame`] gives
//! the diagnostic [`ErrorFrame`] sent back to the originator.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::identifiers::RequestId;

use super::message::Envelope;
use super::message_type::MessageType;
use super::schema::{self, type_name};

// ============================================================================
// Constants
// ============================================================================

/// Message reported when a frame is not valid JSON.
pub const MALFORMED_MESSAGE: &str = "Must be a valid JSON string";

/// Value of the `error` field in every [`ErrorFrame`].
pub const VALIDATION_ERROR_TAG: &str = "ValidationError";

// ============================================================================
// ValidationError
// ============================================================================

/// First violation found while validating a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Frame is not parseable as JSON.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Parser diagnostic.
        message: String,
    },

    /// Frame parses but violates the envelope or payload schema.
    #[error("Schema violation at '{path}': {message}")]
    SchemaViolation {
        /// Dotted path of the offending field (`""` for the root).
        path: String,
        /// Description of the violation.
        message: String,
    },
}

impl ValidationError {
    /// Creates a malformed payload error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Creates a schema violation at `path`.
    #[inline]
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the offending field path (`""` for malformed frames).
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::MalformedPayload { .. } => "",
            Self::SchemaViolation { path, .. } => path,
        }
    }

    /// Returns the violation message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MalformedPayload { message } | Self::SchemaViolation { message, .. } => message,
        }
    }

    /// Returns `true` for [`ValidationError::MalformedPayload`].
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedPayload { .. })
    }

    /// Builds the diagnostic frame sent back to the originator.
    #[must_use]
    pub fn to_frame(&self) -> ErrorFrame {
        let mut data = BTreeMap::new();
        data.insert(self.path().to_string(), self.message().to_string());
        ErrorFrame {
            error: VALIDATION_ERROR_TAG.to_string(),
            data,
        }
    }
}

// ============================================================================
// ErrorFrame
// ============================================================================

/// Diagnostic frame sent in place of a response when validation fails.
///
/// # Format
///
/// ```json
/// { "error": "ValidationError", "data": { "data.index": "Required" } }
/// ```
///
/// Has no `requestId` or `type`; it is a distinct frame shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorFrame {
    /// Always [`VALIDATION_ERROR_TAG`].
    pub error: String,
    /// Field path to message.
    pub data: BTreeMap<String, String>,
}

impl ErrorFrame {
    /// Recognizes a text frame as an error frame.
    ///
    /// Returns `None` for envelopes and anything else.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str::<Self>(text)
            .ok()
            .filter(|frame| frame.error == VALIDATION_ERROR_TAG)
    }

    /// Encodes the frame as text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Validates one raw text frame.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(text: &str) -> Result<Envelope, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| ValidationError::malformed(MALFORMED_MESSAGE))?;
    validate_value(&value)
}

/// Validates an already parsed frame.
///
/// The `type` discriminator is checked before `requestId`, then the
/// payload is delegated to the schema registry.
///
/// # Errors
///
/// Returns the first [`ValidationError::SchemaViolation`] encountered.
pub fn validate_value(value: &Value) -> Result<Envelope, ValidationError> {
    let Value::Object(obj) = value else {
        return Err(ValidationError::schema(
            "",
            format!("Expected object, received {}", type_name(value)),
        ));
    };

    let message_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(MessageType::from_tag)
        .ok_or_else(invalid_discriminator)?;

    let request_id = match obj.get("requestId") {
        Some(Value::String(id)) => RequestId::new(id.as_str()),
        None if message_type.is_push() => RequestId::push(),
        None => return Err(ValidationError::schema("requestId", "Required")),
        Some(other) => {
            return Err(ValidationError::schema(
                "requestId",
                format!("Expected string, received {}", type_name(other)),
            ));
        }
    };

    let message = schema::validate_payload(message_type, obj.get("data"))?;

    Ok(Envelope {
        request_id,
        message,
    })
}

/// Violation for a missing or unknown `type`.
fn invalid_discriminator() -> ValidationError {
    let expected = MessageType::ALL
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    ValidationError::schema(
        "type",
        format!("Invalid discriminator value. Expected {expected}"),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use crate::protocol::payload::{
        ConnectionType, DeviceInfo, ElementStyles, LogLevel, LogRecord, StorageContent,
        StorageType,
    };
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_envelope_cases() {
        let cases = [
            (json!({"requestId": "req", "type": "get-device-info", "data": null}), ""),
            (
                json!({"requestId": "req", "type": "get-device-info-res",
                       "data": {"id": "id", "name": "name", "connectionType": "wifi"}}),
                "",
            ),
            (
                json!({"requestId": "req", "type": "get-storage-res",
                       "data": {"storageType": "local", "data": {}}}),
                "",
            ),
            (json!({"requestId": "req", "type": "clear-logs-res", "data": null}), ""),
            (json!({"requestId": null, "type": "get-device-info", "data": null}), "requestId"),
            (json!({"type": "get-device-info", "data": null}), "requestId"),
            (json!({"requestId": "req", "type": null, "data": null}), "type"),
            (json!({"requestId": "req", "type": "refresh-elements", "data": null}), "type"),
            (json!({"requestId": "req", "data": null}), "type"),
            (json!({"requestId": null, "type": null}), "type"),
            (json!({"requestId": "req", "type": "get-elements", "data": 123}), "data"),
            (
                json!({"requestId": "req", "type": "get-element-data-res",
                       "data": {"index": "abc", "data": {"height": "100px"}}}),
                "data.index",
            ),
            (
                json!({"requestId": "req", "type": "get-storage-res",
                       "data": {"storageType": "local", "data": null}}),
                "data.data",
            ),
            (json!({"requestId": "req", "type": "clear-logs-res", "data": "abc"}), "data"),
            (json!([1, 2, 3]), ""),
        ];

        for (value, expected_path) in cases {
            let text = value.to_string();
            let result = validate(&text);

            if expected_path.is_empty() && value.is_object() {
                let envelope = result.unwrap_or_else(|e| panic!("{text} rejected: {e}"));
                let encoded: Value =
                    serde_json::from_str(&envelope.encode().expect("encode")).expect("json");
                assert_eq!(encoded, value);
            } else {
                let err = result.expect_err(&text);
                assert!(!err.is_malformed());
                assert_eq!(err.path(), expected_path, "{text}");
            }
        }
    }

    #[test]
    fn test_malformed_frames() {
        let cases = [
            r#"{"a": "1"#,
            r#"{"a": 1"#,
            r#"{a: 1}"#,
            r#"{a: "1"}"#,
            "a",
            "",
            r#"{"requestId":"a","type":"clear-logs"}{"requestId":"b","type":"clear-logs"}"#,
        ];

        for text in cases {
            let err = validate(text).expect_err(text);
            assert!(err.is_malformed(), "{text}");
            assert_eq!(err.message(), MALFORMED_MESSAGE);
        }
    }

    #[test]
    fn test_unknown_type_reports_type_path() {
        let err = validate(r#"{"requestId":"r","type":"bogus","data":null}"#).expect_err("bogus");
        assert_eq!(err.path(), "type");
        assert!(err.message().starts_with("Invalid discriminator value. Expected 'get-device-info'"));
    }

    #[test]
    fn test_push_without_request_id() {
        let text = r#"{"type":"new-log","data":{"source":"app","level":"warn","data":["x"],"timestamp":"2024"}}"#;
        let envelope = validate(text).expect("valid push");
        assert!(envelope.request_id.is_push());
        assert_eq!(envelope.message_type(), MessageType::NewLog);
    }

    #[test]
    fn test_error_frame_shape() {
        let err = validate(r#"{"requestId":null,"type":"get-device-info","data":null}"#)
            .expect_err("null request id");
        let frame = err.to_frame();
        let text = frame.encode().expect("encode");
        assert_eq!(
            text,
            r#"{"error":"ValidationError","data":{"requestId":"Expected string, received null"}}"#
        );
        assert_eq!(ErrorFrame::parse(&text), Some(frame));
    }

    #[test]
    fn test_malformed_error_frame() {
        let frame = validate("{oops").expect_err("malformed").to_frame();
        assert_eq!(frame.data.get(""), Some(&MALFORMED_MESSAGE.to_string()));
    }

    #[test]
    fn test_error_frame_does_not_match_envelope() {
        assert!(ErrorFrame::parse(r#"{"requestId":"r","type":"clear-logs","data":null}"#).is_none());
        assert!(ErrorFrame::parse(r#"{"error":"Other","data":{}}"#).is_none());
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn string_map() -> impl Strategy<Value = crate::protocol::StringMap> {
        proptest::collection::btree_map("[a-z-]{1,8}", ".{0,12}", 0..4)
    }

    fn message() -> impl Strategy<Value = Message> {
        prop_oneof![
            Just(Message::GetDeviceInfo),
            ("[a-z0-9]{1,8}", ".{1,12}", any::<bool>()).prop_map(|(id, name, usb)| {
                Message::GetDeviceInfoRes(DeviceInfo {
                    id,
                    name,
                    connection_type: if usb {
                        ConnectionType::Usb
                    } else {
                        ConnectionType::Wifi
                    },
                })
            }),
            ".{0,32}".prop_map(Message::GetElementsRes),
            (0u64..10_000, string_map()).prop_map(|(index, styles)| {
                Message::SetElementStyles(ElementStyles { index, styles })
            }),
            (any::<bool>(), string_map()).prop_map(|(local, data)| {
                Message::SetStorage(StorageContent {
                    storage_type: if local {
                        StorageType::Local
                    } else {
                        StorageType::Session
                    },
                    data,
                })
            }),
            (0usize..4, proptest::collection::vec(".{0,8}", 0..4), ".{0,10}").prop_map(
                |(level, data, source)| {
                    Message::NewLog(LogRecord {
                        source,
                        level: LogLevel::ALL[level],
                        data,
                        timestamp: "2024-01-01T00:00:00.000Z".into(),
                    })
                }
            ),
            Just(Message::ClearLogsRes),
        ]
    }

    proptest! {
        #[test]
        fn prop_arbitrary_text_never_panics(text in ".*") {
            let result = validate(&text);
            if serde_json::from_str::<Value>(&text).is_err() {
                prop_assert!(result.expect_err("not json").is_malformed());
            }
        }

        #[test]
        fn prop_valid_envelopes_roundtrip(id in "[a-zA-Z0-9-]{1,16}", message in message()) {
            let envelope = Envelope::new(id.as_str(), message);
            let text = envelope.encode().expect("encode");
            let decoded = validate(&text).expect("decode");
            prop_assert_eq!(&decoded, &envelope);
            prop_assert_eq!(decoded.encode().expect("encode"), text);
        }
    }
}
