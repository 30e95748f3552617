//! Analytics capabilities — the tracking client and the event queue a page
//! exposes for tag managers.
//!
//! The emitter accepts these as injected `Arc<dyn ..>` collaborators instead of
//! reading page globals.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Event name used by the tracking-client sink.
pub const EXPERIMENT_STARTED_EVENT: &str = "$experiment_started";

/// A global analytics client exposing a `track` call (Mixpanel style).
pub trait Tracker: Send + Sync {
    fn track(&self, event_name: &str, payload: serde_json::Value);
}

/// A global event queue that tag managers drain (`dataLayer` style).
pub trait DataLayer: Send + Sync {
    fn push(&self, entry: serde_json::Value);
}

/// A call recorded by [`CaptureTracker`].
#[derive(Debug, Clone, Serialize)]
pub struct TrackedEvent {
    pub event_name: String,
    pub payload: serde_json::Value,
    pub tracked_at: DateTime<Utc>,
}

/// In-memory tracker that captures calls.
#[derive(Default)]
pub struct CaptureTracker {
    events: Mutex<Vec<TrackedEvent>>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Tracker for CaptureTracker {
    fn track(&self, event_name: &str, payload: serde_json::Value) {
        self.events.lock().push(TrackedEvent {
            event_name: event_name.to_string(),
            payload,
            tracked_at: Utc::now(),
        });
    }
}

/// In-memory event queue. Starts empty, as if created on first push.
#[derive(Default)]
pub struct CaptureDataLayer {
    entries: Mutex<Vec<serde_json::Value>>,
}

impl CaptureDataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<serde_json::Value> {
        self.entries.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl DataLayer for CaptureDataLayer {
    fn push(&self, entry: serde_json::Value) {
        self.entries.lock().push(entry);
    }
}

/// Convenience: a capturing tracker for tests and page replays.
pub fn capture_tracker() -> Arc<CaptureTracker> {
    Arc::new(CaptureTracker::new())
}

/// Convenience: a capturing event queue for tests and page replays.
pub fn capture_data_layer() -> Arc<CaptureDataLayer> {
    Arc::new(CaptureDataLayer::new())
}
