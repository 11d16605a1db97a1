//! # Round-Trip Timer Module
//!
//! Measures how long a message takes to reach the rendering host and come
//! back.
//!
//! ## Plain English
//!
//! We note the time, send `TestTime`, and when the host answers with a
//! `Timer` event we look at the clock again. Purely diagnostic: a reply with
//! no matching start is simply ignored.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::bridge::{HostBridge, HostCommand};
use crate::error::BridgeResult;

/// One completed measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundTrip {
    pub elapsed: Duration,
    /// Wall-clock time the reply arrived
    pub completed_at: DateTime<Utc>,
}

/// Host round-trip latency probe
#[derive(Default)]
pub struct RoundTripTimer {
    pending: Mutex<Option<Instant>>,
    last: Mutex<Option<RoundTrip>>,
}

impl RoundTripTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start time and sends `TestTime`.
    ///
    /// A second `start` before the reply restarts the measurement.
    pub fn start(&self, bridge: &HostBridge) -> BridgeResult<()> {
        log::info!("Testing round-trip time...");
        *self.pending.lock() = Some(Instant::now());
        bridge.send(&HostCommand::TestTime)
    }

    /// Finishes the pending measurement, if any.
    pub fn complete(&self) -> Option<Duration> {
        let started = self.pending.lock().take()?;
        let elapsed = started.elapsed();

        log::info!(
            "Round-trip time (ms): {:.3}",
            elapsed.as_secs_f64() * 1000.0
        );
        *self.last.lock() = Some(RoundTrip {
            elapsed,
            completed_at: Utc::now(),
        });
        Some(elapsed)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Most recent completed measurement.
    pub fn last(&self) -> Option<RoundTrip> {
        *self.last.lock()
    }
}

// ============================================
// TESTS
// ============================================
