//! Device session: configuration, lifecycle and request dispatch.
//!
//! # Example
//!
//! ```no_run
//! use kaiware::{Result, Session};
//!
//! # async fn example() -> Result<()> {
//! let session = Session::builder()
//!     .address("192.168.1.10")
//!     .port(8080)
//!     .build()?;
//!
//! session.connect().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Builder for sessions.
pub mod builder;

/// Session type and lifecycle.
mod core;

/// Inbound request routing.
pub mod dispatcher;

/// Session configuration.
pub mod options;

/// Connection state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use self::core::Session;
pub use dispatcher::{CONSOLE_UNSUPPORTED, Dispatcher};
pub use options::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME, DEFAULT_SOURCE_ID, SessionOptions};
pub use state::SessionState;
