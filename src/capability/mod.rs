//! Capability providers: what the device can actually do.
//!
//! The session routes every validated request to one [`Capabilities`]
//! method. Hosts implement the methods their environment supports; the
//! rest fall back to [`HandlerError::Unsupported`], which the session
//! reports back as an `error` envelope.
//!
//! | Request | Method | Default |
//! |---------|--------|---------|
//! | `get-device-info` | [`Capabilities::get_device_info`] | configured identity |
//! | `get-elements` | [`Capabilities::get_elements`] | unsupported |
//! | `get-element-styles` | [`Capabilities::get_element_styles`] | unsupported |
//! | `set-element-styles` | [`Capabilities::set_element_styles`] | unsupported |
//! | `get-element-data` | [`Capabilities::get_element_data`] | unsupported |
//! | `set-element-data` | [`Capabilities::set_element_data`] | unsupported |
//! | `get-storage` | [`Capabilities::get_storage`] | unsupported |
//! | `set-storage` | [`Capabilities::set_storage`] | unsupported |
//! | `clear-logs` | [`Capabilities::clear_logs`] | no-op |
//! | `execute-console-command` | [`Capabilities::console_root`] | unsupported |
//!
//! Two capabilities ship with the crate and push on their own:
//! [`Logger`] (`new-log`) and [`NetworkObserver`] (`network-request-update`).
//! Both reach the wire through an [`Outbox`].

// ============================================================================
// Submodules
// ============================================================================

/// Log forwarding.
pub mod logging;

/// Network request tracking.
pub mod network;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::console::Inspectable;
use crate::protocol::{DeviceInfo, Message, MessageType, StorageType, StringMap};

// ============================================================================
// Re-exports
// ============================================================================

pub use logging::{ConsoleHooks, ConsoleMethod, LogArg, LogSink, Logger, TracingSink};
pub use network::{Completion, NetworkObserver};

// ============================================================================
// HandlerError
// ============================================================================

/// Failure of one capability method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The host does not implement this request.
    #[error("{message_type} is not supported")]
    Unsupported {
        /// Request type.
        message_type: MessageType,
    },

    /// The host tried and failed.
    #[error("{message}")]
    Failed {
        /// Failure description.
        message: String,
    },
}

impl HandlerError {
    /// Creates an unsupported error.
    #[inline]
    #[must_use]
    pub fn unsupported(message_type: MessageType) -> Self {
        Self::Unsupported { message_type }
    }

    /// Creates a failure error.
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Host-implemented request handlers.
///
/// Handlers never see the transport; they return payloads and the session
/// wraps them in correlated responses.
#[async_trait]
pub trait Capabilities: Send + Sync {
    /// Returns the device identity. Defaults to the configured `identity`.
    async fn get_device_info(&self, identity: &DeviceInfo) -> Result<DeviceInfo, HandlerError> {
        Ok(identity.clone())
    }

    /// Returns the serialized document markup.
    async fn get_elements(&self) -> Result<String, HandlerError> {
        Err(HandlerError::unsupported(MessageType::GetElements))
    }

    /// Returns the computed styles of the element at `index`.
    async fn get_element_styles(&self, index: u64) -> Result<StringMap, HandlerError> {
        let _ = index;
        Err(HandlerError::unsupported(MessageType::GetElementStyles))
    }

    /// Applies inline styles to the element at `index`.
    async fn set_element_styles(&self, index: u64, styles: StringMap) -> Result<(), HandlerError> {
        let _ = (index, styles);
        Err(HandlerError::unsupported(MessageType::SetElementStyles))
    }

    /// Returns the data attributes of the element at `index`.
    async fn get_element_data(&self, index: u64) -> Result<StringMap, HandlerError> {
        let _ = index;
        Err(HandlerError::unsupported(MessageType::GetElementData))
    }

    /// Writes data attributes of the element at `index`.
    async fn set_element_data(&self, index: u64, data: StringMap) -> Result<(), HandlerError> {
        let _ = (index, data);
        Err(HandlerError::unsupported(MessageType::SetElementData))
    }

    /// Returns the content of a storage area.
    async fn get_storage(&self, storage_type: StorageType) -> Result<StringMap, HandlerError> {
        let _ = storage_type;
        Err(HandlerError::unsupported(MessageType::GetStorage))
    }

    /// Writes entries into a storage area.
    async fn set_storage(
        &self,
        storage_type: StorageType,
        data: StringMap,
    ) -> Result<(), HandlerError> {
        let _ = (storage_type, data);
        Err(HandlerError::unsupported(MessageType::SetStorage))
    }

    /// Clears the device console.
    async fn clear_logs(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Root object for console expressions; `None` disables the console.
    fn console_root(&self) -> Option<Arc<dyn Inspectable>> {
        None
    }
}

/// Capabilities with every default in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapabilities;

impl Capabilities for NoCapabilities {}

// ============================================================================
// Outbox
// ============================================================================

/// Outbound path for pushes.
///
/// Implemented by the session over its live connection.
pub trait Outbox: Send + Sync {
    /// Queues a push message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoActiveConnection`] when disconnected.
    fn push(&self, message: Message) -> crate::Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
