//! WebSocket transport layer.
//!
//! The device is the WebSocket client; the inspector listens.
//!
//! ```text
//! ┌──────────────────┐                           ┌──────────────────┐
//! │  Device (Rust)   │         WebSocket         │  Inspector       │
//! │                  │                           │                  │
//! │  Session         │──────────────────────────►│  WebSocket       │
//! │  → Connection    │    ws://address:port      │  Server          │
//! │                  │◄──────────────────────────│                  │
//! └──────────────────┘                           └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Dial the inspector, spawn the event loop
//! 2. Inbound frames go to the session's `FrameHandler`
//! 3. `Connection::send_text` - Queue pushes from any task
//! 4. `Connection::shutdown` - Close; the close callback clears the session

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{CONNECT_TIMEOUT, CloseCallback, Connection, FrameHandler};
