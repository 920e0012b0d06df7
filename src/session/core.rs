//! Session: one device's link to an inspector.
//!
//! A [`Session`] owns the connection slot, the dispatcher serving inbound
//! requests, and the two pushing capabilities ([`Logger`] and
//! [`NetworkObserver`]). Nothing is global; build as many as needed.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::capability::{Capabilities, LogSink, Logger, NetworkObserver};
use crate::error::{Error, Result};
use crate::protocol::{Envelope, Message};
use crate::transport::Connection;

use super::builder::SessionBuilder;
use super::dispatcher::Dispatcher;
use super::options::SessionOptions;
use super::state::{LinkHandle, SessionState};

// ============================================================================
// Session
// ============================================================================

/// Device-side protocol session.
///
/// # Example
///
/// ```no_run
/// use kaiware::{Result, Session};
///
/// # async fn example() -> Result<()> {
/// let session = Session::builder()
///     .address("192.168.1.10")
///     .port(8080)
///     .build()?;
///
/// session.connect().await?;
/// session.logger().info(["device ready"]);
/// session.disconnect()?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    options: SessionOptions,
    endpoint: Url,
    link: LinkHandle,
    dispatcher: Arc<Dispatcher>,
    logger: Logger,
    network: Arc<NetworkObserver>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn new(
        options: SessionOptions,
        endpoint: Url,
        capabilities: Arc<dyn Capabilities>,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let link = LinkHandle::default();
        let outbox = Arc::new(link.clone());

        let dispatcher = Arc::new(Dispatcher::new(options.identity(), capabilities));
        let logger = Logger::new(
            options.source_id.clone(),
            options.hooks,
            log_sink,
            outbox.clone(),
        );
        let network = Arc::new(NetworkObserver::new(options.network_requests, outbox));

        Self {
            options,
            endpoint,
            link,
            dispatcher,
            logger,
            network,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the options the session was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns the inspector endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.link.state()
    }

    /// Returns `true` while connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Returns the log forwarder.
    #[inline]
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Returns the network request observer.
    #[inline]
    #[must_use]
    pub fn network(&self) -> &Arc<NetworkObserver> {
        &self.network
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens the connection to the inspector.
    ///
    /// A no-op (logged) while connecting or connected.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportFailure`] if the handshake fails
    /// - [`Error::ConnectionClosed`] if the socket closed before the
    ///   session could record it
    pub async fn connect(&self) -> Result<()> {
        let generation = match self.link.begin_connect() {
            Ok(generation) => generation,
            Err(e) => {
                info!(state = %self.state(), "Connection already established");
                debug!(error = %e, "Connect ignored");
                return Ok(());
            }
        };

        let link = self.link.clone();
        let on_close = Box::new(move || {
            if link.release(generation) {
                info!(generation, "WebSocket connection closed");
            }
        });

        let connection =
            match Connection::open(&self.endpoint, self.dispatcher.clone(), on_close).await {
                Ok(connection) => connection,
                Err(e) => {
                    self.link.release(generation);
                    error!(url = %self.endpoint, error = %e, "Failed to connect");
                    return Err(e);
                }
            };

        if !self.link.establish(generation, connection.clone()) {
            connection.shutdown();
            warn!(url = %self.endpoint, "Connection closed during setup");
            return Err(Error::ConnectionClosed);
        }

        info!(url = %self.endpoint, "Connected to inspector");
        Ok(())
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveConnection`] if not connected.
    pub fn disconnect(&self) -> Result<()> {
        let Some(connection) = self.link.take() else {
            warn!("No connection to disconnect");
            return Err(Error::NoActiveConnection);
        };

        connection.shutdown();
        info!(url = %self.endpoint, "Disconnected from inspector");
        Ok(())
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Sends a response or push envelope.
    ///
    /// Replies to inbound requests are sent by the dispatcher. Anything other
    /// than a push sent here is not paired with a pending request; it is
    /// still delivered, with a warning.
    ///
    /// # Errors
    ///
    /// - [`Error::NoActiveConnection`] if not connected
    /// - [`Error::ConnectionClosed`] if the connection is closing
    pub fn send_message(&self, envelope: &Envelope) -> Result<()> {
        if is_unsolicited(envelope) {
            warn!(
                request_id = %envelope.request_id,
                message_type = %envelope.message_type(),
                "Sending message outside request dispatch"
            );
        } else {
            debug!(
                request_id = %envelope.request_id,
                message_type = %envelope.message_type(),
                "Sending message"
            );
        }
        self.link.send(envelope)
    }

    /// Sends a push with an empty `requestId`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::send_message`].
    pub fn push(&self, message: Message) -> Result<()> {
        self.send_message(&Envelope::push(message))
    }
}

/// Non-push envelopes are only expected as dispatcher replies.
fn is_unsolicited(envelope: &Envelope) -> bool {
    !envelope.message_type().is_push()
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(connection) = self.link.take() {
            connection.shutdown();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
