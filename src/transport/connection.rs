//! WebSocket client connection and event loop.
//!
//! [`Connection::open`] dials the inspector and spawns one tokio task per
//! connection. The task handles:
//!
//! - Inbound text frames, one at a time, through a [`FrameHandler`]
//! - Replies produced by the handler
//! - Outbound frames queued from any task via [`Connection::send_text`]
//! - Shutdown, remote close and socket errors
//!
//! The outbound queue is the only handle to the socket. When the loop ends
//! for any reason the `on_close` callback runs exactly once.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the opening handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

/// Consumer of inbound text frames.
#[async_trait]
pub trait FrameHandler: Send + Sync + 'static {
    /// Handles one frame; a returned string is sent back as a reply.
    async fn handle_frame(&self, text: &str) -> Option<String>;
}

/// Callback run once when the event loop ends.
pub type CloseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send one text frame.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

/// Runs the close callback when dropped, including during a panic.
struct CloseGuard(Option<CloseCallback>);

impl Drop for CloseGuard {
    fn drop(&mut self) {
        if let Some(on_close) = self.0.take() {
            on_close();
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to a live WebSocket connection.
///
/// Cheap to clone; all clones feed the same outbound queue.
#[derive(Clone)]
pub struct Connection {
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Dials `url` and spawns the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportFailure`] if the handshake fails or does
    /// not finish within [`CONNECT_TIMEOUT`].
    pub async fn open(
        url: &Url,
        handler: Arc<dyn FrameHandler>,
        on_close: CloseCallback,
    ) -> Result<Self> {
        debug!(url = %url, "Opening WebSocket connection");

        let (ws_stream, _response) = timeout(CONNECT_TIMEOUT, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "handshake with {url} timed out after {}ms",
                    CONNECT_TIMEOUT.as_millis()
                ))
            })?
            .map_err(|e| Error::transport(format!("{url}: {e}")))?;

        debug!(url = %url, "WebSocket connection established");
        Ok(Self::spawn(ws_stream, handler, on_close))
    }

    /// Spawns the event loop over an established stream.
    pub(crate) fn spawn<S>(
        ws_stream: WebSocketStream<S>,
        handler: Arc<dyn FrameHandler>,
        on_close: CloseCallback,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let _on_close = CloseGuard(Some(on_close));
            Self::run_event_loop(ws_stream, command_rx, handler).await;
        });

        Self { command_tx }
    }

    /// Queues one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has ended.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Asks the event loop to close the socket.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Returns `true` once the event loop has ended.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        handler: Arc<dyn FrameHandler>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Inbound frames from the inspector
                message = ws_read.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            trace!(len = text.len(), "Frame received");

                            if let Some(reply) = handler.handle_frame(text.as_str()).await
                                && let Err(e) = ws_write.send(WsMessage::Text(reply.into())).await
                            {
                                error!(error = %e, "Failed to send reply");
                                break;
                            }
                        }

                        Some(Ok(WsMessage::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Outbound frames from the session
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                                warn!(error = %e, "Failed to send frame");
                                break;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        command_rx.close();
        debug!("Event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
