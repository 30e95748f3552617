//! Mixpanel adaptor — builds the properties of a `$experiment_started`
//! `track` call.

use anyhow::Result;
use optimize_core::config::SinkKind;
use optimize_core::tracking::EXPERIMENT_STARTED_EVENT;
use tracing::debug;

use super::ExperimentAdaptor;
use crate::events::ExperimentStarted;

#[derive(Debug, Clone, Default)]
pub struct MixpanelAdaptor;

impl MixpanelAdaptor {
    pub fn new() -> Self {
        Self
    }

    /// Event name passed to `track`.
    pub fn event_name(&self) -> &'static str {
        EXPERIMENT_STARTED_EVENT
    }
}

impl ExperimentAdaptor for MixpanelAdaptor {
    fn kind(&self) -> SinkKind {
        SinkKind::Mixpanel
    }

    fn transform(&self, event: &ExperimentStarted) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "Experiment name": event.experiment_name,
            "Variant name": event.variant_name,
        });

        debug!(
            experiment = %event.experiment_name,
            variant = %event.variant_name,
            "Mixpanel track properties transformed"
        );

        Ok(payload)
    }

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let adaptor = MixpanelAdaptor::new();
        let payload = adaptor
            .transform(&ExperimentStarted::new("Donate Header", "Red Button"))
            .unwrap();
        assert_eq!(payload["Experiment name"], "Donate Header");
        assert_eq!(payload["Variant name"], "Red Button");
        assert_eq!(payload.as_object().unwrap().len(), 2);
        assert_eq!(adaptor.event_name(), "$experiment_started");
        assert_eq!(adaptor.kind(), SinkKind::Mixpanel);
    }
}
