//! Network request tracking.
//!
//! The host calls into a [`NetworkObserver`] from its HTTP hooks. Every
//! change to a request is pushed as a `network-request-update`:
//!
//! ```text
//! on_start ──► pending ──┬─► on_complete ──► success
//!    │                   ├─► on_error    ──► error
//!    ▼                   ├─► on_abort    ──► aborted
//! on_header_set          └─► on_timeout  ──► timeout
//! ```
//!
//! Terminal states are final. Once a request leaves `pending` it is
//! forgotten, and later updates for its id are refused. Updates are pushed
//! while the request table is locked, so the wire order of one request's
//! updates matches the order they were applied in.
//!
//! At most [`MAX_IN_FLIGHT`] requests are tracked. Starting one more evicts
//! the oldest pending request without pushing anything for it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::identifiers::NetworkRequestId;
use crate::protocol::{
    Header, HttpMethod, LifecycleStatus, Message, NetworkRequest, timestamp_now,
};

use super::Outbox;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of pending requests tracked at once.
pub const MAX_IN_FLIGHT: usize = 512;

// ============================================================================
// Completion
// ============================================================================

/// Response details reported on successful completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// HTTP status code.
    pub status_code: Option<u16>,
    /// Response headers.
    pub response_headers: Vec<Header>,
    /// Response body.
    pub response_body: Option<String>,
    /// Declared response type (`json`, `text`, ...).
    pub response_type: Option<String>,
}

// ============================================================================
// NetworkObserver
// ============================================================================

/// Tracks in-flight requests and pushes their updates.
pub struct NetworkObserver {
    enabled: bool,
    outbox: Arc<dyn Outbox>,
    in_flight: Mutex<InFlight>,
}

/// Pending requests keyed by id, with their start order.
#[derive(Default)]
struct InFlight {
    requests: FxHashMap<NetworkRequestId, (u64, NetworkRequest)>,
    started: u64,
}

impl InFlight {
    fn insert(&mut self, request: NetworkRequest) {
        if self.requests.len() >= MAX_IN_FLIGHT {
            self.evict_oldest();
        }
        self.started += 1;
        self.requests
            .insert(request.request_id.clone(), (self.started, request));
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .requests
            .iter()
            .min_by_key(|(_, (order, _))| *order)
            .map(|(request_id, _)| request_id.clone());

        if let Some(request_id) = oldest {
            self.requests.remove(&request_id);
            warn!(request_id = %request_id, limit = MAX_IN_FLIGHT, "Dropped oldest pending network request");
        }
    }
}

impl std::fmt::Debug for NetworkObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkObserver")
            .field("enabled", &self.enabled)
            .field("in_flight", &self.in_flight.lock().requests.len())
            .finish_non_exhaustive()
    }
}

impl NetworkObserver {
    /// Creates an observer. A disabled observer tracks and pushes nothing.
    pub fn new(enabled: bool, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            enabled,
            outbox,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    /// Returns `true` if updates are tracked.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the number of pending requests.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().requests.len()
    }

    /// Records a sent request and returns its id.
    pub fn on_start(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        body: Option<String>,
    ) -> NetworkRequestId {
        let request_id = NetworkRequestId::generate();
        if !self.enabled {
            return request_id;
        }

        let request = NetworkRequest {
            request_id: request_id.clone(),
            url: url.into(),
            method,
            lifecycle_status: LifecycleStatus::Pending,
            request_headers: None,
            response_headers: None,
            request_body: body,
            response_body: None,
            response_type: None,
            status_code: None,
            start_time: timestamp_now(),
            end_time: None,
        };

        debug!(request_id = %request_id, url = %request.url, "Network request started");
        let mut in_flight = self.in_flight.lock();
        in_flight.insert(request.clone());
        self.publish(request);
        request_id
    }

    /// Appends a request header.
    ///
    /// Returns the updated record, or `None` if the request is unknown or
    /// finished.
    pub fn on_header_set(
        &self,
        request_id: &NetworkRequestId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<NetworkRequest> {
        let header = Header::new(name, value);
        self.update(request_id, |request| {
            request
                .request_headers
                .get_or_insert_with(Vec::new)
                .push(header);
        })
    }

    /// Marks the request successful.
    pub fn on_complete(
        &self,
        request_id: &NetworkRequestId,
        completion: Completion,
    ) -> Option<NetworkRequest> {
        self.finish(request_id, LifecycleStatus::Success, |request| {
            request.status_code = completion.status_code;
            request.response_headers = Some(completion.response_headers);
            request.response_body = completion.response_body;
            request.response_type = completion.response_type;
        })
    }

    /// Marks the request failed at the network level.
    pub fn on_error(&self, request_id: &NetworkRequestId) -> Option<NetworkRequest> {
        self.finish(request_id, LifecycleStatus::Error, |_| {})
    }

    /// Marks the request aborted.
    pub fn on_abort(&self, request_id: &NetworkRequestId) -> Option<NetworkRequest> {
        self.finish(request_id, LifecycleStatus::Aborted, |_| {})
    }

    /// Marks the request timed out.
    pub fn on_timeout(&self, request_id: &NetworkRequestId) -> Option<NetworkRequest> {
        self.finish(request_id, LifecycleStatus::Timeout, |_| {})
    }

    fn update(
        &self,
        request_id: &NetworkRequestId,
        apply: impl FnOnce(&mut NetworkRequest),
    ) -> Option<NetworkRequest> {
        if !self.enabled {
            return None;
        }

        let mut in_flight = self.in_flight.lock();
        let (_, request) = in_flight.requests.get_mut(request_id)?;
        apply(request);

        let updated = request.clone();
        self.publish(updated.clone());
        Some(updated)
    }

    fn finish(
        &self,
        request_id: &NetworkRequestId,
        status: LifecycleStatus,
        apply: impl FnOnce(&mut NetworkRequest),
    ) -> Option<NetworkRequest> {
        if !self.enabled {
            return None;
        }

        let mut in_flight = self.in_flight.lock();
        let Some((_, mut request)) = in_flight.requests.remove(request_id) else {
            warn!(
                request_id = %request_id,
                status = status.as_str(),
                "Refusing update for finished or unknown request"
            );
            return None;
        };

        apply(&mut request);
        request.lifecycle_status = status;
        request.end_time = Some(timestamp_now());

        debug!(request_id = %request_id, status = status.as_str(), "Network request finished");
        self.publish(request.clone());
        Some(request)
    }

    fn publish(&self, request: NetworkRequest) {
        if let Err(e) = self.outbox.push(Message::NetworkRequestUpdate(request)) {
            debug!(error = %e, "Network update not sent");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
