//! Split-URL experiments — whole pages act as variants. The page knows which
//! experiment and variant it belongs to, so no selection happens here; the
//! page only reports the exposure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emitter::EventEmitter;
use crate::events::{EmitOutcome, ExperimentStarted, SkipReason};

/// Settings printed into a page that takes part in a split-URL test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitUrlSettings {
    #[serde(default)]
    pub current_post_is_variant: bool,
    #[serde(default)]
    pub current_post_experiment_name: String,
    #[serde(default)]
    pub current_post_variant_name: String,
}

/// Reports the exposure for a split-URL variant page.
pub fn emit_split_url_event(settings: &SplitUrlSettings, emitter: &EventEmitter) -> EmitOutcome {
    if !settings.current_post_is_variant {
        debug!("page is not a split URL variant");
        return EmitOutcome::Skipped(SkipReason::NotAVariant);
    }

    emitter.emit(&ExperimentStarted::new(
        settings.current_post_experiment_name.clone(),
        settings.current_post_variant_name.clone(),
    ))
}
