//! Adaptors for translating experiment events into analytics sink payloads.
//!
//! Each adaptor implements [`ExperimentAdaptor`] to transform an
//! [`ExperimentStarted`] event into the JSON shape its sink expects
//! (Mixpanel `track` properties, or a tag-manager `dataLayer` entry).

pub mod datalayer;
pub mod mixpanel;

use anyhow::Result;
use optimize_core::config::SinkKind;

use crate::events::ExperimentStarted;

/// Adaptor trait — transforms experiment events into a sink-specific payload.
pub trait ExperimentAdaptor: Send + Sync {
    /// Sink this adaptor feeds.
    fn kind(&self) -> SinkKind;

    /// Transform an experiment event into the sink's payload format.
    fn transform(&self, event: &ExperimentStarted) -> Result<serde_json::Value>;

    /// Validate that the adaptor configuration is correct.
    fn validate_config(&self) -> Result<()>;
}
