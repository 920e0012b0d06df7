//! Wire protocol: message types, payloads and validation.
//!
//! Every frame in either direction is one JSON text frame:
//!
//! ```json
//! { "requestId": "r1", "type": "get-storage", "data": { "storageType": "local" } }
//! ```
//!
//! # Message Kinds
//!
//! | Kind | Example | Correlation |
//! |------|---------|-------------|
//! | Request | `get-device-info` | fresh `requestId` |
//! | Response | `get-device-info-res` | echoes the request's `requestId` |
//! | Push | `new-log`, `network-request-update` | empty `requestId` |
//! | Error | `error` | echoes the failed request's `requestId` |
//!
//! Frames that fail validation are answered with an [`ErrorFrame`]
//! instead of an envelope.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message_type` | Closed set of type tags |
//! | `payload` | Typed payload structs |
//! | `message` | [`Envelope`] and [`Message`] union |
//! | `schema` | Per-type payload rules |
//! | `validation` | Three-gate inbound pipeline |

// ============================================================================
// Submodules
// ============================================================================

/// Message-type tags.
pub mod message_type;

/// Payload types.
pub mod payload;

/// Envelope and message union.
pub mod message;

/// Payload schema registry.
pub mod schema;

/// Inbound validation pipeline.
pub mod validation;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{Envelope, Message};
pub use message_type::MessageType;
pub use payload::{
    ConnectionType, ConsoleCommand, ConsoleResult, DeviceInfo, ElementData, ElementIndex,
    ElementStyles, ErrorReport, Header, HttpMethod, LifecycleStatus, LogLevel, LogRecord,
    NetworkRequest, StorageContent, StorageQuery, StorageType, StringMap, timestamp_now,
};
pub use validation::{ErrorFrame, ValidationError, validate, validate_value};
