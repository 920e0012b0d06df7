//! Message envelope and tagged payload union.
//!
//! # Format
//!
//! ```json
//! {
//!   "requestId": "r1",
//!   "type": "get-element-styles",
//!   "data": { "index": 3 }
//! }
//! ```
//!
//! Encoding goes through [`Envelope::encode`]. Decoding always goes through
//! the validation pipeline ([`Envelope::decode`]); [`Message`] deliberately
//! has no `Deserialize` impl.

// ============================================================================
// Imports
// ============================================================================

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::RequestId;

use super::message_type::MessageType;
use super::payload::{
    ConsoleCommand, ConsoleResult, DeviceInfo, ElementData, ElementIndex, ElementStyles,
    ErrorReport, LogRecord, NetworkRequest, StorageContent, StorageQuery,
};
use super::validation::{self, ValidationError};

// ============================================================================
// Message
// ============================================================================

/// Payload union keyed by message type.
///
/// Exactly one variant per [`MessageType`]; the mapping is checked by the
/// compiler in [`Message::message_type`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `get-device-info`
    GetDeviceInfo,
    /// `get-device-info-res`
    GetDeviceInfoRes(DeviceInfo),
    /// `get-elements`
    GetElements,
    /// `get-elements-res`
    GetElementsRes(String),
    /// `get-element-styles`
    GetElementStyles(ElementIndex),
    /// `get-element-styles-res`
    GetElementStylesRes(ElementStyles),
    /// `set-element-styles`
    SetElementStyles(ElementStyles),
    /// `set-element-styles-res`
    SetElementStylesRes,
    /// `get-element-data`
    GetElementData(ElementIndex),
    /// `get-element-data-res`
    GetElementDataRes(ElementData),
    /// `set-element-data`
    SetElementData(ElementData),
    /// `set-element-data-res`
    SetElementDataRes,
    /// `get-storage`
    GetStorage(StorageQuery),
    /// `get-storage-res`
    GetStorageRes(StorageContent),
    /// `set-storage`
    SetStorage(StorageContent),
    /// `set-storage-res`
    SetStorageRes,
    /// `new-log`
    NewLog(LogRecord),
    /// `clear-logs`
    ClearLogs,
    /// `clear-logs-res`
    ClearLogsRes,
    /// `network-request-update`
    NetworkRequestUpdate(NetworkRequest),
    /// `execute-console-command`
    ExecuteConsoleCommand(ConsoleCommand),
    /// `execute-console-command-res`
    ExecuteConsoleCommandRes(ConsoleResult),
    /// `error`
    Error(ErrorReport),
}

impl Message {
    /// Returns the type tag of this payload.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::GetDeviceInfo => MessageType::GetDeviceInfo,
            Self::GetDeviceInfoRes(_) => MessageType::GetDeviceInfoRes,
            Self::GetElements => MessageType::GetElements,
            Self::GetElementsRes(_) => MessageType::GetElementsRes,
            Self::GetElementStyles(_) => MessageType::GetElementStyles,
            Self::GetElementStylesRes(_) => MessageType::GetElementStylesRes,
            Self::SetElementStyles(_) => MessageType::SetElementStyles,
            Self::SetElementStylesRes => MessageType::SetElementStylesRes,
            Self::GetElementData(_) => MessageType::GetElementData,
            Self::GetElementDataRes(_) => MessageType::GetElementDataRes,
            Self::SetElementData(_) => MessageType::SetElementData,
            Self::SetElementDataRes => MessageType::SetElementDataRes,
            Self::GetStorage(_) => MessageType::GetStorage,
            Self::GetStorageRes(_) => MessageType::GetStorageRes,
            Self::SetStorage(_) => MessageType::SetStorage,
            Self::SetStorageRes => MessageType::SetStorageRes,
            Self::NewLog(_) => MessageType::NewLog,
            Self::ClearLogs => MessageType::ClearLogs,
            Self::ClearLogsRes => MessageType::ClearLogsRes,
            Self::NetworkRequestUpdate(_) => MessageType::NetworkRequestUpdate,
            Self::ExecuteConsoleCommand(_) => MessageType::ExecuteConsoleCommand,
            Self::ExecuteConsoleCommandRes(_) => MessageType::ExecuteConsoleCommandRes,
            Self::Error(_) => MessageType::Error,
        }
    }

    /// Serializes the payload into its `data` value.
    ///
    /// Payload-less variants serialize to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn data(&self) -> Result<Value> {
        let value = match self {
            Self::GetDeviceInfo
            | Self::GetElements
            | Self::SetElementStylesRes
            | Self::SetElementDataRes
            | Self::SetStorageRes
            | Self::ClearLogs
            | Self::ClearLogsRes => Value::Null,
            Self::GetDeviceInfoRes(p) => serde_json::to_value(p)?,
            Self::GetElementsRes(p) => Value::String(p.clone()),
            Self::GetElementStyles(p) | Self::GetElementData(p) => serde_json::to_value(p)?,
            Self::GetElementStylesRes(p) | Self::SetElementStyles(p) => serde_json::to_value(p)?,
            Self::GetElementDataRes(p) | Self::SetElementData(p) => serde_json::to_value(p)?,
            Self::GetStorage(p) => serde_json::to_value(p)?,
            Self::GetStorageRes(p) | Self::SetStorage(p) => serde_json::to_value(p)?,
            Self::NewLog(p) => serde_json::to_value(p)?,
            Self::NetworkRequestUpdate(p) => serde_json::to_value(p)?,
            Self::ExecuteConsoleCommand(p) => serde_json::to_value(p)?,
            Self::ExecuteConsoleCommandRes(p) => serde_json::to_value(p)?,
            Self::Error(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// The unit of wire exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Correlation token (empty for pushes).
    pub request_id: RequestId,
    /// Typed payload.
    pub message: Message,
}

impl Envelope {
    /// Creates an envelope with the given correlation token.
    #[inline]
    #[must_use]
    pub fn new(request_id: impl Into<RequestId>, message: Message) -> Self {
        Self {
            request_id: request_id.into(),
            message,
        }
    }

    /// Creates a push envelope with an empty correlation token.
    #[inline]
    #[must_use]
    pub fn push(message: Message) -> Self {
        Self {
            request_id: RequestId::push(),
            message,
        }
    }

    /// Returns the type tag.
    #[inline]
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message.message_type()
    }

    /// Encodes the envelope as one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes and validates one text frame.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn decode(text: &str) -> std::result::Result<Self, ValidationError> {
        validation::validate(text)
    }
}

/// Borrowed wire shape used for serialization.
#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "requestId")]
    request_id: &'a RequestId,
    #[serde(rename = "type")]
    message_type: MessageType,
    data: Value,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let data = self.message.data().map_err(S::Error::custom)?;
        WireEnvelope {
            request_id: &self.request_id,
            message_type: self.message_type(),
            data,
        }
        .serialize(serializer)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::payload::{ConnectionType, StorageType, StringMap};

    #[test]
    fn test_encode_null_payload() {
        let envelope = Envelope::new("req", Message::GetDeviceInfo);
        let json = envelope.encode().expect("encode");
        assert_eq!(json, r#"{"requestId":"req","type":"get-device-info","data":null}"#);
    }

    #[test]
    fn test_encode_device_info_response() {
        let envelope = Envelope::new(
            "r1",
            Message::GetDeviceInfoRes(DeviceInfo {
                id: "id".into(),
                name: "name".into(),
                connection_type: ConnectionType::Wifi,
            }),
        );
        let json = envelope.encode().expect("encode");
        assert_eq!(
            json,
            r#"{"requestId":"r1","type":"get-device-info-res","data":{"id":"id","name":"name","connectionType":"wifi"}}"#
        );
    }

    #[test]
    fn test_encode_string_payload() {
        let envelope = Envelope::new("r2", Message::GetElementsRes("<html></html>".into()));
        let json = envelope.encode().expect("encode");
        assert!(json.contains(r#""data":"<html></html>""#));
    }

    #[test]
    fn test_push_has_empty_request_id() {
        let envelope = Envelope::push(Message::ClearLogs);
        assert!(envelope.request_id.is_push());
        let json = envelope.encode().expect("encode");
        assert!(json.starts_with(r#"{"requestId":"""#));
    }

    #[test]
    fn test_encode_then_decode_storage() {
        let mut data = StringMap::new();
        data.insert("theme".into(), "dark".into());
        let envelope = Envelope::new(
            "r3",
            Message::SetStorage(StorageContent {
                storage_type: StorageType::Session,
                data,
            }),
        );

        let json = envelope.encode().expect("encode");
        let decoded = Envelope::decode(&json).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_message_type_matches_tag() {
        assert_eq!(
            Message::SetElementStylesRes.message_type(),
            MessageType::SetElementStylesRes
        );
        assert_eq!(
            Message::Error(ErrorReport {
                message: "x".into()
            })
            .message_type(),
            MessageType::Error
        );
    }
}
