//! Tag-manager adaptor — transforms experiment events into `dataLayer` push
//! entries picked up by a tag-manager container.

use anyhow::{anyhow, Result};
use optimize_core::config::SinkKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ExperimentAdaptor;
use crate::events::ExperimentStarted;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataLayerConfig {
    /// Value of the `event` key in each push.
    pub event_name: String,
}

pub struct DataLayerAdaptor {
    config: DataLayerConfig,
}

impl DataLayerAdaptor {
    pub fn new(config: DataLayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataLayerConfig {
        &self.config
    }
}

impl ExperimentAdaptor for DataLayerAdaptor {
    fn kind(&self) -> SinkKind {
        SinkKind::Datalayer
    }

    fn transform(&self, event: &ExperimentStarted) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "event": self.config.event_name,
            "experiment_name": event.experiment_name,
            "variant_name": event.variant_name,
        });

        debug!(
            event_name = %self.config.event_name,
            experiment = %event.experiment_name,
            "dataLayer push transformed"
        );

        Ok(payload)
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.event_name.trim().is_empty() {
            return Err(anyhow!("dataLayer event name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adaptor(event_name: &str) -> DataLayerAdaptor {
        DataLayerAdaptor::new(DataLayerConfig {
            event_name: event_name.into(),
        })
    }

    #[test]
    fn test_transform() {
        let payload = adaptor("gp_experiment")
            .transform(&ExperimentStarted::new("Header", "Blue"))
            .unwrap();
        assert_eq!(payload["event"], "gp_experiment");
        assert_eq!(payload["experiment_name"], "Header");
        assert_eq!(payload["variant_name"], "Blue");
    }

    #[test]
    fn test_validate_config() {
        assert!(adaptor("gp_experiment").validate_config().is_ok());
        assert!(adaptor("").validate_config().is_err());
        assert!(adaptor("   ").validate_config().is_err());
    }

    #[test]
    fn test_empty_event_name_still_transforms() {
        let payload = adaptor("")
            .transform(&ExperimentStarted::new("Header", "Blue"))
            .unwrap();
        assert_eq!(payload["event"], "");
    }
}
