//! Kaiware - device-side inspector protocol for KaiOS-style handsets.
//!
//! A device opens one WebSocket to a desktop inspector, answers its
//! requests (device info, DOM, styles, storage, console commands) and
//! pushes log records and network request updates as they happen.
//!
//! # Architecture
//!
//! - **Inspector (remote)**: Listens on `ws://address:port`, sends requests
//! - **Session (local)**: Connects out, validates every frame, dispatches
//!   requests to host [`Capabilities`], pushes logs and network updates
//!
//! Key design principles:
//!
//! - Every frame is validated before it is typed ([`protocol::validate`])
//! - Invalid frames are answered with a `ValidationError` frame, never dropped
//! - Responses echo the request's `requestId`; pushes carry an empty one
//! - Host handlers never touch the transport
//!
//! # Quick Start
//!
//! ```no_run
//! use kaiware::{Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .address("192.168.1.10")
//!         .port(8080)
//!         .device_name("Test Handset")
//!         .network_requests(true)
//!         .build()?;
//!
//!     session.connect().await?;
//!     session.logger().info(["application started"]);
//!
//!     session.disconnect()?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], its builder and request dispatch |
//! | [`capability`] | Host handlers, log forwarding, network observation |
//! | [`console`] | Remote console command parsing and evaluation |
//! | [`protocol`] | Message types, payloads and validation |
//! | [`transport`] | WebSocket connection (internal) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Host capabilities and pushing services.
///
/// - [`Capabilities`] - Request handlers the host implements
/// - [`Logger`] - Log forwarding with console hooks
/// - [`NetworkObserver`] - Network request lifecycle tracking
pub mod capability;

/// Remote console commands.
pub mod console;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Wire protocol: message catalogue, payloads and validation.
pub mod protocol;

/// Device sessions.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// WebSocket transport layer.
///
/// Internal module owning the socket and its event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{Session, SessionBuilder, SessionOptions, SessionState};

// Capability types
pub use capability::{
    Capabilities, Completion, ConsoleHooks, ConsoleMethod, HandlerError, LogArg, LogSink, Logger,
    NetworkObserver, NoCapabilities, TracingSink,
};

// Console types
pub use console::{CommandError, Inspectable, Member};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{NetworkRequestId, RequestId};

// Protocol types
pub use protocol::{
    ConnectionType, DeviceInfo, Envelope, HttpMethod, LogLevel, Message, MessageType, StorageType,
    StringMap,
};
