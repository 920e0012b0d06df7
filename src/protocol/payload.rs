//! Typed payloads carried in the envelope `data` field.
//!
//! One type per payload shape. Several message types share a shape
//! (e.g. `get-element-styles` and `get-element-data` both carry an
//! [`ElementIndex`]).

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::NetworkRequestId;

// ============================================================================
// Types
// ============================================================================

/// String-to-string mapping used for styles, data attributes and storage.
pub type StringMap = BTreeMap<String, String>;

/// Returns the current UTC time in RFC 3339 format with millisecond precision.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Device
// ============================================================================

/// How the device is linked to the inspector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Network link.
    #[default]
    Wifi,
    /// Cable link.
    Usb,
}

/// Device identity (`get-device-info-res`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable device identifier.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Link type.
    #[serde(rename = "connectionType")]
    pub connection_type: ConnectionType,
}

// ============================================================================
// Elements
// ============================================================================

/// Reference to one element by document-order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIndex {
    /// Zero-based element index.
    pub index: u64,
}

/// Styles of one element (`get-element-styles-res`, `set-element-styles`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStyles {
    /// Zero-based element index.
    pub index: u64,
    /// CSS property to value.
    pub styles: StringMap,
}

/// Data attributes of one element (`get-element-data-res`, `set-element-data`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
    /// Zero-based element index.
    pub index: u64,
    /// Attribute name to value.
    pub data: StringMap,
}

// ============================================================================
// Storage
// ============================================================================

/// Web storage area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Persistent storage.
    Local,
    /// Per-session storage.
    Session,
}

/// Storage read request (`get-storage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageQuery {
    /// Area to read.
    #[serde(rename = "storageType")]
    pub storage_type: StorageType,
}

/// Storage content (`get-storage-res`, `set-storage`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageContent {
    /// Area read or written.
    #[serde(rename = "storageType")]
    pub storage_type: StorageType,
    /// Key to value.
    pub data: StringMap,
}

// ============================================================================
// Logs
// ============================================================================

/// Log level, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug output.
    Debug,
    /// Informational output.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Every level, in declaration order.
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One log record (`new-log`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Application that produced the record.
    pub source: String,
    /// Severity.
    pub level: LogLevel,
    /// Pre-stringified arguments.
    pub data: Vec<String>,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

// ============================================================================
// Network
// ============================================================================

/// HTTP method of an observed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// GET.
    #[default]
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
    /// PATCH.
    Patch,
}

impl HttpMethod {
    /// Every method, in declaration order.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
        }
    }

    /// Parses a method name, ignoring case.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }
}

/// Lifecycle of an observed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    /// Sent, no outcome yet.
    Pending,
    /// Completed.
    Success,
    /// Failed at the network level.
    Error,
    /// Aborted by the caller.
    Aborted,
    /// Timed out.
    Timeout,
}

impl LifecycleStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Success,
        Self::Error,
        Self::Aborted,
        Self::Timeout,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::Aborted => "aborted",
            Self::Timeout => "timeout",
        }
    }

    /// Returns `true` once no further updates are accepted.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a header.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Network request record (`network-request-update`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// Request identity.
    pub request_id: NetworkRequestId,
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Current lifecycle status.
    pub lifecycle_status: LifecycleStatus,
    /// Headers set on the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Vec<Header>>,
    /// Headers received with the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Vec<Header>>,
    /// Body sent with the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    /// Body received with the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    /// Declared response type (`json`, `text`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    /// HTTP status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// RFC 3339 send time.
    pub start_time: String,
    /// RFC 3339 terminal time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

// ============================================================================
// Console
// ============================================================================

/// Console expression request (`execute-console-command`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleCommand {
    /// Expression to evaluate.
    pub command: String,
    /// Maximum nesting depth of the serialized result.
    #[serde(rename = "parseDepth", default, skip_serializing_if = "Option::is_none")]
    pub parse_depth: Option<u32>,
}

/// Console expression outcome (`execute-console-command-res`).
///
/// At most one of `result` and `error` is set. Both absent means the
/// expression evaluated to nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleResult {
    /// Serialized result value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Evaluation error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConsoleResult {
    /// Creates a successful outcome.
    #[inline]
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed outcome.
    #[inline]
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }

    /// Returns `true` if evaluation failed.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// Error
// ============================================================================

/// Handler failure report (`error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Failure description.
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================
