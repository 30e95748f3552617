//! Event emitter — dispatches one experiment-started event to whichever sink
//! the configuration selects.
//!
//! Delivery is best effort: a missing tracking client means the event is
//! dropped, never retried.

use std::sync::Arc;

use optimize_core::config::{ConfigProvider, SinkKind};
use optimize_core::tracking::{DataLayer, Tracker};
use tracing::{debug, info, warn};

use crate::adaptors::datalayer::{DataLayerAdaptor, DataLayerConfig};
use crate::adaptors::mixpanel::MixpanelAdaptor;
use crate::adaptors::ExperimentAdaptor;
use crate::events::{EmitOutcome, ExperimentStarted, SkipReason};

pub struct EventEmitter {
    config: Arc<dyn ConfigProvider>,
    tracker: Option<Arc<dyn Tracker>>,
    data_layer: Arc<dyn DataLayer>,
}

impl EventEmitter {
    /// Emitter without a tracking client; the event queue always exists.
    pub fn new(config: Arc<dyn ConfigProvider>, data_layer: Arc<dyn DataLayer>) -> Self {
        Self {
            config,
            tracker: None,
            data_layer,
        }
    }

    /// Attach the page's tracking client.
    pub fn with_tracker(mut self, tracker: Arc<dyn Tracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn emit(&self, event: &ExperimentStarted) -> EmitOutcome {
        let sink = self.config.sink_config();

        if event.preview && !sink.track_previews {
            debug!(experiment = %event.experiment_name, "preview not tracked");
            return EmitOutcome::Skipped(SkipReason::PreviewNotTracked);
        }

        match sink.kind {
            SinkKind::Mixpanel => {
                let Some(tracker) = self.tracker.as_ref() else {
                    debug!(
                        experiment = %event.experiment_name,
                        "tracking client not loaded, event dropped"
                    );
                    return EmitOutcome::Skipped(SkipReason::TrackerMissing);
                };
                let adaptor = MixpanelAdaptor::new();
                match adaptor.transform(event) {
                    Ok(payload) => {
                        tracker.track(adaptor.event_name(), payload);
                        info!(
                            experiment = %event.experiment_name,
                            variant = %event.variant_name,
                            "experiment event sent to Mixpanel"
                        );
                        EmitOutcome::Tracked
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to build Mixpanel payload");
                        EmitOutcome::Skipped(SkipReason::TransformFailed)
                    }
                }
            }
            SinkKind::Datalayer => {
                let adaptor = DataLayerAdaptor::new(DataLayerConfig {
                    event_name: sink.event_name,
                });
                if let Err(e) = adaptor.validate_config() {
                    warn!(error = %e, "dataLayer sink misconfigured, pushing anyway");
                }
                match adaptor.transform(event) {
                    Ok(payload) => {
                        self.data_layer.push(payload);
                        info!(
                            experiment = %event.experiment_name,
                            variant = %event.variant_name,
                            "experiment event pushed to dataLayer"
                        );
                        EmitOutcome::Pushed
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to build dataLayer payload");
                        EmitOutcome::Skipped(SkipReason::TransformFailed)
                    }
                }
            }
            SinkKind::Disabled => {
                debug!("no analytics sink configured");
                EmitOutcome::Skipped(SkipReason::SinkDisabled)
            }
        }
    }
}
