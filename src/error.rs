//! Error types for the inspector protocol crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use kaiware::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     session.connect().await?;
//!     session.logger().info(["ready"]);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Protocol | [`Error::Validation`], [`Error::HandlerFailure`] |
//! | Connection | [`Error::TransportFailure`], [`Error::ConnectionClosed`], [`Error::ConnectionAlreadyEstablished`], [`Error::NoActiveConnection`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::protocol::{MessageType, ValidationError};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`crate::SessionBuilder::build`] for invalid options.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A capability handler failed.
    #[error("Handler for {message_type} failed: {message}")]
    HandlerFailure {
        /// Request type being handled.
        message_type: MessageType,
        /// Failure description.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport could not be opened or broke.
    #[error("Transport failure: {message}")]
    TransportFailure {
        /// Description of the failure.
        message: String,
    },

    /// WebSocket connection closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// `connect` called while connecting or connected.
    #[error("Connection already established")]
    ConnectionAlreadyEstablished,

    /// Operation needs a connection and there is none.
    #[error("No active connection")]
    NoActiveConnection,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a handler failure error.
    #[inline]
    pub fn handler_failure(message_type: MessageType, message: impl Into<String>) -> Self {
        Self::HandlerFailure {
            message_type,
            message: message.into(),
        }
    }

    /// Creates a transport failure error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure { .. }
                | Self::ConnectionClosed
                | Self::NoActiveConnection
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a validation error.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
