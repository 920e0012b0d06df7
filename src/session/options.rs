//! Session configuration.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `device_id` | `kaios-device` |
//! | `device_name` | `KaiOS Device` |
//! | `connection_type` | `wifi` |
//! | `source_id` | `my-app` |
//! | `hooks` | all off |
//! | `network_requests` | off |
//!
//! `address` and `port` have no default and must be set.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::Ipv6Addr;

use url::Url;

use crate::capability::ConsoleHooks;
use crate::error::{Error, Result};
use crate::protocol::{ConnectionType, DeviceInfo};

// ============================================================================
// Constants
// ============================================================================

/// Default device identifier.
pub const DEFAULT_DEVICE_ID: &str = "kaios-device";

/// Default device name.
pub const DEFAULT_DEVICE_NAME: &str = "KaiOS Device";

/// Default log source id.
pub const DEFAULT_SOURCE_ID: &str = "my-app";

// ============================================================================
// SessionOptions
// ============================================================================

/// Device identity, inspector endpoint and forwarding switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Inspector host name or IP address.
    pub address: String,

    /// Inspector port.
    pub port: u16,

    /// Device identifier reported by `get-device-info`.
    pub device_id: String,

    /// Device name reported by `get-device-info`.
    pub device_name: String,

    /// Link type reported by `get-device-info`.
    pub connection_type: ConnectionType,

    /// Source stamped on forwarded log records.
    pub source_id: String,

    /// Console forwarding switches.
    pub hooks: ConsoleHooks,

    /// Track and push network requests.
    pub network_requests: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 0,
            device_id: DEFAULT_DEVICE_ID.to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            connection_type: ConnectionType::default(),
            source_id: DEFAULT_SOURCE_ID.to_string(),
            hooks: ConsoleHooks::default(),
            network_requests: false,
        }
    }
}

impl SessionOptions {
    /// Returns the configured device identity.
    #[must_use]
    pub fn identity(&self) -> DeviceInfo {
        DeviceInfo {
            id: self.device_id.clone(),
            name: self.device_name.clone(),
            connection_type: self.connection_type,
        }
    }

    /// Returns the inspector endpoint, `ws://address:port`.
    ///
    /// IPv6 literals may be given with or without brackets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the address does not form a valid URL.
    pub fn endpoint(&self) -> Result<Url> {
        let host = match self.address.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{ip}]"),
            Err(_) if self.address.contains(':') && !self.address.starts_with('[') => {
                // `set_host` would silently cut the host at the colon.
                return Err(self.invalid_address("the port is set with .port()"));
            }
            Err(_) => self.address.clone(),
        };

        let mut url = Url::parse("ws://localhost").map_err(|e| self.invalid_address(e))?;
        url.set_host(Some(&host)).map_err(|e| self.invalid_address(e))?;
        url.set_port(Some(self.port))
            .map_err(|()| self.invalid_address("port not allowed"))?;

        Ok(url)
    }

    fn invalid_address(&self, reason: impl fmt::Display) -> Error {
        Error::config(format!(
            "Invalid inspector address '{}': {reason}",
            self.address
        ))
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for the first invalid field.
    pub fn validate(&self) -> Result<Url> {
        if self.address.trim().is_empty() {
            return Err(Error::config(
                "Inspector address is required. Use .address() to set it.\n\
                 Example: Session::builder().address(\"192.168.1.10\")",
            ));
        }

        if self.port == 0 {
            return Err(Error::config(
                "Inspector port is required. Use .port() to set it.\n\
                 Example: Session::builder().port(8080)",
            ));
        }

        if self.device_id.is_empty() {
            return Err(Error::config("Device id must not be empty"));
        }

        if self.device_name.is_empty() {
            return Err(Error::config("Device name must not be empty"));
        }

        self.endpoint()
    }
}

// ============================================================================
// Tests
// ============================================================================
