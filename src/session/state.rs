//! Connection state machine.
//!
//! ```text
//!              connect()            open ok
//! Disconnected ─────────► Connecting ───────► Connected
//!      ▲                      │                   │
//!      └──────────────────────┴───────────────────┘
//!         open failed / socket closed / disconnect()
//! ```
//!
//! Each `connect` attempt takes a new generation number. Close callbacks
//! carry the generation they were registered with, so a late callback from
//! an old connection never clears a newer one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::capability::Outbox;
use crate::error::{Error, Result};
use crate::protocol::{Envelope, Message};
use crate::transport::Connection;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connection open.
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

// ============================================================================
// Link
// ============================================================================

#[derive(Debug, Default)]
struct Link {
    state: SessionState,
    connection: Option<Connection>,
    generation: u64,
}

/// Shared, lockable connection slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkHandle(Arc<Mutex<Link>>);

impl LinkHandle {
    /// Returns the current state.
    pub(crate) fn state(&self) -> SessionState {
        self.0.lock().state
    }

    /// Moves to `Connecting` and returns the attempt's generation.
    ///
    /// Fails with [`Error::ConnectionAlreadyEstablished`] unless
    /// disconnected.
    pub(crate) fn begin_connect(&self) -> Result<u64> {
        let mut link = self.0.lock();
        if link.state != SessionState::Disconnected {
            return Err(Error::ConnectionAlreadyEstablished);
        }
        link.generation += 1;
        link.state = SessionState::Connecting;
        Ok(link.generation)
    }

    /// Stores an opened connection for attempt `generation`.
    ///
    /// Returns `false` if the attempt was superseded or already closed.
    pub(crate) fn establish(&self, generation: u64, connection: Connection) -> bool {
        let mut link = self.0.lock();
        if link.generation != generation || link.state != SessionState::Connecting {
            return false;
        }
        link.state = SessionState::Connected;
        link.connection = Some(connection);
        true
    }

    /// Resets after attempt `generation` ended, failed or closed.
    ///
    /// Returns `false` if a newer attempt owns the slot.
    pub(crate) fn release(&self, generation: u64) -> bool {
        let mut link = self.0.lock();
        if link.generation != generation {
            trace!(generation, current = link.generation, "Stale release ignored");
            return false;
        }
        link.state = SessionState::Disconnected;
        link.connection = None;
        true
    }

    /// Detaches the open connection, if any.
    pub(crate) fn take(&self) -> Option<Connection> {
        let mut link = self.0.lock();
        let connection = link.connection.take()?;
        link.generation += 1;
        link.state = SessionState::Disconnected;
        Some(connection)
    }

    /// Queues an envelope on the open connection.
    pub(crate) fn send(&self, envelope: &Envelope) -> Result<()> {
        let text = envelope.encode()?;
        let link = self.0.lock();
        match &link.connection {
            Some(connection) => connection.send_text(text),
            None => Err(Error::NoActiveConnection),
        }
    }
}

impl Outbox for LinkHandle {
    fn push(&self, message: Message) -> Result<()> {
        self.send(&Envelope::push(message))
    }
}

// ============================================================================
// Tests
// ============================================================================
