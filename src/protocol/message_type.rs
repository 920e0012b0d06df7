//! Closed set of message-type tags.
//!
//! Every envelope carries exactly one of these tags in its `type` field.
//! Tags are kebab-case on the wire (`get-device-info`, `new-log`, ...).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// MessageType
// ============================================================================

/// Message-type discriminant.
///
/// The set is closed: an unknown tag is a validation failure, never an
/// extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    /// Request device identity.
    GetDeviceInfo,
    /// Device identity.
    GetDeviceInfoRes,

    /// Request serialized document markup.
    GetElements,
    /// Serialized document markup.
    GetElementsRes,

    /// Request computed styles of one element.
    GetElementStyles,
    /// Computed styles of one element.
    GetElementStylesRes,
    /// Apply inline styles to one element.
    SetElementStyles,
    /// Style update acknowledgement.
    SetElementStylesRes,

    /// Request data attributes of one element.
    GetElementData,
    /// Data attributes of one element.
    GetElementDataRes,
    /// Write data attributes of one element.
    SetElementData,
    /// Data update acknowledgement.
    SetElementDataRes,

    /// Request the content of a storage area.
    GetStorage,
    /// Content of a storage area.
    GetStorageRes,
    /// Write entries into a storage area.
    SetStorage,
    /// Storage write acknowledgement.
    SetStorageRes,

    /// Streamed log record (push).
    NewLog,
    /// Clear the device console.
    ClearLogs,
    /// Console clear acknowledgement.
    ClearLogsRes,

    /// Network request lifecycle update (push).
    NetworkRequestUpdate,

    /// Evaluate a console expression.
    ExecuteConsoleCommand,
    /// Console expression result.
    ExecuteConsoleCommandRes,

    /// Handler failure report.
    Error,
}

impl MessageType {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 23] = [
        Self::GetDeviceInfo,
        Self::GetDeviceInfoRes,
        Self::GetElements,
        Self::GetElementsRes,
        Self::GetElementStyles,
        Self::GetElementStylesRes,
        Self::SetElementStyles,
        Self::SetElementStylesRes,
        Self::GetElementData,
        Self::GetElementDataRes,
        Self::SetElementData,
        Self::SetElementDataRes,
        Self::GetStorage,
        Self::GetStorageRes,
        Self::SetStorage,
        Self::SetStorageRes,
        Self::NewLog,
        Self::ClearLogs,
        Self::ClearLogsRes,
        Self::NetworkRequestUpdate,
        Self::ExecuteConsoleCommand,
        Self::ExecuteConsoleCommandRes,
        Self::Error,
    ];

    /// Returns the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetDeviceInfo => "get-device-info",
            Self::GetDeviceInfoRes => "get-device-info-res",
            Self::GetElements => "get-elements",
            Self::GetElementsRes => "get-elements-res",
            Self::GetElementStyles => "get-element-styles",
            Self::GetElementStylesRes => "get-element-styles-res",
            Self::SetElementStyles => "set-element-styles",
            Self::SetElementStylesRes => "set-element-styles-res",
            Self::GetElementData => "get-element-data",
            Self::GetElementDataRes => "get-element-data-res",
            Self::SetElementData => "set-element-data",
            Self::SetElementDataRes => "set-element-data-res",
            Self::GetStorage => "get-storage",
            Self::GetStorageRes => "get-storage-res",
            Self::SetStorage => "set-storage",
            Self::SetStorageRes => "set-storage-res",
            Self::NewLog => "new-log",
            Self::ClearLogs => "clear-logs",
            Self::ClearLogsRes => "clear-logs-res",
            Self::NetworkRequestUpdate => "network-request-update",
            Self::ExecuteConsoleCommand => "execute-console-command",
            Self::ExecuteConsoleCommandRes => "execute-console-command-res",
            Self::Error => "error",
        }
    }

    /// Looks up a tag by its wire name.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Returns the paired response tag for request types.
    ///
    /// Returns `None` for responses, pushes and [`MessageType::Error`].
    #[must_use]
    pub const fn response_type(self) -> Option<Self> {
        match self {
            Self::GetDeviceInfo => Some(Self::GetDeviceInfoRes),
            Self::GetElements => Some(Self::GetElementsRes),
            Self::GetElementStyles => Some(Self::GetElementStylesRes),
            Self::SetElementStyles => Some(Self::SetElementStylesRes),
            Self::GetElementData => Some(Self::GetElementDataRes),
            Self::SetElementData => Some(Self::SetElementDataRes),
            Self::GetStorage => Some(Self::GetStorageRes),
            Self::SetStorage => Some(Self::SetStorageRes),
            Self::ClearLogs => Some(Self::ClearLogsRes),
            Self::ExecuteConsoleCommand => Some(Self::ExecuteConsoleCommandRes),
            _ => None,
        }
    }

    /// Returns `true` for request types that expect a paired response.
    #[inline]
    #[must_use]
    pub const fn is_request(self) -> bool {
        self.response_type().is_some()
    }

    /// Returns `true` for fire-and-forget pushes.
    ///
    /// Pushes may carry an empty or absent `requestId`.
    #[inline]
    #[must_use]
    pub const fn is_push(self) -> bool {
        matches!(self, Self::NewLog | Self::NetworkRequestUpdate)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_serde_names() {
        for tag in MessageType::ALL {
            let json = serde_json::to_string(&tag).expect("serialize");
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_from_tag_roundtrip() {
        for tag in MessageType::ALL {
            assert_eq!(MessageType::from_tag(tag.as_str()), Some(tag));
        }
        assert_eq!(MessageType::from_tag("refresh-elements"), None);
    }

    #[test]
    fn test_every_request_pairs_with_a_response() {
        for tag in MessageType::ALL.into_iter().filter(|t| t.is_request()) {
            let res = tag.response_type().expect("paired response");
            assert_eq!(res.as_str(), format!("{}-res", tag.as_str()));
            assert!(!res.is_request());
        }
    }

    #[test]
    fn test_push_types() {
        assert!(MessageType::NewLog.is_push());
        assert!(MessageType::NetworkRequestUpdate.is_push());
        assert!(!MessageType::GetStorage.is_push());
        assert!(!MessageType::NewLog.is_request());
    }
}
