//! Coordinator clock estimation.
//!
//! Each accepted probe response overwrites the previous estimate. Latency is
//! assumed symmetric: `offset = (serverTime + rtt / 2) - now`.

use std::sync::Arc;

use cuepoint_server::infrastructure::dto::websocket::{ServerTime, SyncRequest, SyncResponse};
use cuepoint_shared::time::Clock;

/// Estimates the offset between the local clock and the coordinator clock
pub struct ClockSyncEstimator {
    clock: Arc<dyn Clock>,
    offset_millis: f64,
    last_rtt_millis: Option<f64>,
    /// Only the latest probe is awaited; older responses are stale
    outstanding: Option<String>,
    next_sequence: u64,
}

impl ClockSyncEstimator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offset_millis: 0.0,
            last_rtt_millis: None,
            outstanding: None,
            next_sequence: 0,
        }
    }

    /// Build a new probe, superseding any probe still in flight
    pub fn request_sync(&mut self) -> SyncRequest {
        self.next_sequence += 1;
        let client_time = self.clock.now_millis();
        let sequence_id = format!("{}-{}", client_time, self.next_sequence);
        self.outstanding = Some(sequence_id.clone());
        SyncRequest {
            client_time,
            sequence_id,
        }
    }

    /// Apply a probe response.
    ///
    /// Returns the new offset in milliseconds, or `None` when the response
    /// does not answer the outstanding probe.
    pub fn on_sync_response(&mut self, response: &SyncResponse) -> Option<f64> {
        if self.outstanding.as_deref() != Some(response.sequence_id.as_str()) {
            tracing::debug!("Ignoring stale sync response '{}'", response.sequence_id);
            return None;
        }
        self.outstanding = None;

        let now = self.clock.now_millis();
        let rtt = (now - response.client_request_time) as f64;
        let offset = (response.server_time as f64 + rtt / 2.0) - now as f64;

        self.offset_millis = offset;
        self.last_rtt_millis = Some(rtt);
        tracing::debug!("Clock offset {:.1} ms (rtt {:.1} ms)", offset, rtt);
        Some(offset)
    }

    /// Rough calibration from the connect greeting; ignored once a probe has answered
    pub fn on_server_time(&mut self, server_time: &ServerTime) {
        if self.is_calibrated() {
            return;
        }
        self.offset_millis = (server_time.timestamp - self.clock.now_millis()) as f64;
    }

    /// Best estimate of the coordinator's current time (epoch ms)
    pub fn synced_now(&self) -> i64 {
        self.clock.now_millis() + self.offset_millis.round() as i64
    }

    pub fn offset_millis(&self) -> f64 {
        self.offset_millis
    }

    pub fn last_rtt_millis(&self) -> Option<f64> {
        self.last_rtt_millis
    }

    /// Whether at least one probe round trip has completed
    pub fn is_calibrated(&self) -> bool {
        self.last_rtt_millis.is_some()
    }

    /// Forget everything learned on a previous connection
    pub fn reset(&mut self) {
        self.offset_millis = 0.0;
        self.last_rtt_millis = None;
        self.outstanding = None;
    }
}
