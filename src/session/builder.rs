//! Builder pattern for session configuration.
//!
//! # Example
//!
//! ```no_run
//! use kaiware::Session;
//!
//! # fn example() -> kaiware::Result<()> {
//! let session = Session::builder()
//!     .address("192.168.1.10")
//!     .port(8080)
//!     .device_name("Test Handset")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::capability::{Capabilities, ConsoleHooks, LogSink, NoCapabilities, TracingSink};
use crate::error::Result;
use crate::protocol::ConnectionType;

use super::core::Session;
use super::options::SessionOptions;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Clone, Default)]
pub struct SessionBuilder {
    options: SessionOptions,
    capabilities: Option<Arc<dyn Capabilities>>,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("options", &self.options)
            .field("capabilities", &self.capabilities.is_some())
            .field("log_sink", &self.log_sink.is_some())
            .finish()
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a new builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inspector host name or IP address.
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.options.address = address.into();
        self
    }

    /// Sets the inspector port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Sets the device identifier.
    #[inline]
    #[must_use]
    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.options.device_id = id.into();
        self
    }

    /// Sets the device name.
    #[inline]
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.options.device_name = name.into();
        self
    }

    /// Sets the reported link type.
    #[inline]
    #[must_use]
    pub fn connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.options.connection_type = connection_type;
        self
    }

    /// Sets the source stamped on log records.
    #[inline]
    #[must_use]
    pub fn source_id(mut self, source: impl Into<String>) -> Self {
        self.options.source_id = source.into();
        self
    }

    /// Sets the console forwarding switches.
    #[inline]
    #[must_use]
    pub fn hooks(mut self, hooks: ConsoleHooks) -> Self {
        self.options.hooks = hooks;
        self
    }

    /// Enables network request tracking.
    #[inline]
    #[must_use]
    pub fn network_requests(mut self, enabled: bool) -> Self {
        self.options.network_requests = enabled;
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the request handlers. Defaults to [`NoCapabilities`].
    #[inline]
    #[must_use]
    pub fn capabilities(mut self, capabilities: impl Capabilities + 'static) -> Self {
        self.capabilities = Some(Arc::new(capabilities));
        self
    }

    /// Sets the local log output. Defaults to [`TracingSink`].
    #[inline]
    #[must_use]
    pub fn log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Builds the session with validation.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Config`] if address or port is not set
    /// - [`crate::Error::Config`] if the address is not a valid host
    /// - [`crate::Error::Config`] if the device id or name is empty
    pub fn build(self) -> Result<Session> {
        let endpoint = self.options.validate()?;
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Arc::new(NoCapabilities));
        let log_sink = self.log_sink.unwrap_or_else(|| Arc::new(TracingSink));

        Ok(Session::new(self.options, endpoint, capabilities, log_sink))
    }
}

// ============================================================================
// Tests
// ============================================================================
