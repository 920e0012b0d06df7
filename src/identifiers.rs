//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers keep correlation tokens from being mixed up with
//! arbitrary strings at compile time.
//!
//! | Type | Wire field | Purpose |
//! |------|------------|---------|
//! | [`RequestId`] | `requestId` | Envelope request/response correlation |
//! | [`NetworkRequestId`] | `data.requestId` | Observed network request identity |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// RequestId
// ============================================================================

/// Opaque correlation token carried by every envelope.
///
/// The token is chosen by whoever sends the request and echoed verbatim on
/// the paired response. Push messages carry an empty token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a request ID from an existing token.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random token (UUID v4).
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the empty token used by push messages.
    #[inline]
    #[must_use]
    pub const fn push() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this is the empty push token.
    #[inline]
    #[must_use]
    pub fn is_push(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    #[inline]
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RequestId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// NetworkRequestId
// ============================================================================

/// Identity of one observed network request.
///
/// Assigned by the network observer when a request starts and used as the
/// key for every later lifecycle update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkRequestId(String);

impl NetworkRequestId {
    /// Creates a network request ID from an existing value.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random ID (UUID v4).
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(!a.is_push());
    }

    #[test]
    fn test_push_request_id_is_empty() {
        let id = RequestId::push();
        assert!(id.is_push());
        assert_eq!(id.as_str(), "");
    }

    #[test]
    fn test_request_id_serializes_transparently() {
        let id = RequestId::new("r1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"r1\"");
        assert_eq!(id.to_string(), "r1");
    }

    #[test]
    fn test_network_request_id_display() {
        let id = NetworkRequestId::new("net-1");
        assert_eq!(id.to_string(), "net-1");
        assert_eq!(id.as_str(), "net-1");
    }
}
