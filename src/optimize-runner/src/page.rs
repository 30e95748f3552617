//! Page replay — rebuilds a rendered page from a JSON snapshot, activates the
//! runtime against it and collects everything the page would have observed.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use optimize_core::config::AppConfig;
use optimize_core::dom::{ContainerElement, ContainerSnapshot, Display, MemoryContainer, MemoryDocument, VariantElement};
use optimize_core::error::OptimizeResult;
use optimize_core::storage::MemoryStore;
use optimize_core::tracking::{capture_data_layer, capture_tracker, TrackedEvent};
use optimize_engine::markup::{OPTIMIZATION_ID_ATTR, VARIANT_ID_ATTR};
use optimize_engine::{ActivationReport, OptimizeRuntime};
use optimize_targeting::PageContext;
use optimize_web_sdk::split_url::{emit_split_url_event, SplitUrlSettings};
use optimize_web_sdk::{EmitOutcome, EventEmitter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A rendered page as captured by the browser-side exporter.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub containers: Vec<ContainerSnapshot>,
    /// Whether the page loaded a tracking client.
    #[serde(default = "default_tracker_loaded")]
    pub tracker_loaded: bool,
    #[serde(default)]
    pub split_url: Option<SplitUrlSettings>,
}

impl PageSnapshot {
    pub fn from_path(path: &Path) -> OptimizeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn default_tracker_loaded() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct VariantVisibility {
    pub variant_id: Option<String>,
    pub display: Display,
}

#[derive(Debug, Serialize)]
pub struct ContainerVisibility {
    pub optimization_id: Option<String>,
    pub variants: Vec<VariantVisibility>,
}

/// Everything observable after one page load.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub report: ActivationReport,
    pub split_url: Option<EmitOutcome>,
    pub local_storage: Vec<(String, String)>,
    pub session_storage: Vec<(String, String)>,
    pub visibility: Vec<ContainerVisibility>,
    pub tracked: Vec<TrackedEvent>,
    pub data_layer: Vec<serde_json::Value>,
}

pub async fn replay(snapshot: PageSnapshot, config: &AppConfig, seed: Option<u64>) -> RunOutput {
    let document = Arc::new(MemoryDocument::new());
    for container in snapshot.containers {
        document.insert(Arc::new(MemoryContainer::from(container)));
    }
    let local: Arc<MemoryStore> = Arc::new(snapshot.local_storage.into_iter().collect());
    let session: Arc<MemoryStore> = Arc::new(snapshot.session_storage.into_iter().collect());

    let tracker = capture_tracker();
    let data_layer = capture_data_layer();
    let mut emitter = EventEmitter::new(Arc::new(config.clone()), data_layer.clone());
    if snapshot.tracker_loaded {
        emitter = emitter.with_tracker(tracker.clone());
    }

    let split_url = snapshot
        .split_url
        .as_ref()
        .map(|settings| emit_split_url_event(settings, &emitter));

    let context = PageContext::new(snapshot.url, local.clone(), session.clone());
    let mut runtime = OptimizeRuntime::new(config, document.clone(), context, emitter);
    if let Some(seed) = seed {
        runtime = runtime.with_rng(StdRng::seed_from_u64(seed));
    }

    // A static snapshot never receives late insertions.
    let report = if document.containers().is_empty() {
        warn!("snapshot has no experiment containers");
        ActivationReport::default()
    } else {
        runtime.activate().await
    };
    info!(
        containers = report.containers.len(),
        emitted = report.emitted(),
        "page replay finished"
    );

    RunOutput {
        report,
        split_url,
        local_storage: local.snapshot(),
        session_storage: session.snapshot(),
        visibility: visibility(&document),
        tracked: tracker.events(),
        data_layer: data_layer.entries(),
    }
}

fn visibility(document: &MemoryDocument) -> Vec<ContainerVisibility> {
    document
        .containers()
        .iter()
        .map(|container| ContainerVisibility {
            optimization_id: container.data(OPTIMIZATION_ID_ATTR),
            variants: container
                .memory_variants()
                .iter()
                .map(|variant| VariantVisibility {
                    variant_id: variant.data(VARIANT_ID_ATTR),
                    display: variant.display(),
                })
                .collect(),
        })
        .collect()
}
