//! Experiment event types — what is reported once a variant has been shown,
//! and what became of the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// "A visitor was exposed to this variant of this experiment."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStarted {
    pub experiment_name: String,
    pub variant_name: String,
    /// Shown through an explicit `force_variant` preview.
    #[serde(default)]
    pub preview: bool,
    pub occurred_at: DateTime<Utc>,
}

impl ExperimentStarted {
    pub fn new(experiment_name: impl Into<String>, variant_name: impl Into<String>) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            variant_name: variant_name.into(),
            preview: false,
            occurred_at: Utc::now(),
        }
    }

    pub fn as_preview(mut self) -> Self {
        self.preview = true;
        self
    }
}

/// Result of one emission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum EmitOutcome {
    /// Sent to the global tracking client.
    Tracked,
    /// Pushed onto the global event queue.
    Pushed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No recognised sink is configured.
    SinkDisabled,
    /// The tracking client is not loaded on the page.
    TrackerMissing,
    /// Previews are configured not to be reported.
    PreviewNotTracked,
    /// The experiment is switched off.
    Inert,
    /// No variant could be resolved for the container.
    Unresolved,
    /// The page is not part of an experiment.
    NotAVariant,
    /// The sink payload could not be built.
    TransformFailed,
}

impl EmitOutcome {
    pub fn is_emitted(&self) -> bool {
        matches!(self, EmitOutcome::Tracked | EmitOutcome::Pushed)
    }
}
