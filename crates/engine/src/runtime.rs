//! Optimization runtime — waits for experiment containers, then runs the full
//! pipeline once per container: read payload, select, persist, show the
//! winner, report the exposure.
//!
//! Containers are independent. Two containers sharing an optimization id are
//! coupled only through the sticky assignment they both read and write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use optimize_core::config::{AppConfig, EngineConfig, InertPolicy};
use optimize_core::dom::{ContainerElement, Document};
use optimize_targeting::PageContext;
use optimize_web_sdk::{EmitOutcome, EventEmitter, ExperimentStarted, SkipReason};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gate::wait_for_container;
use crate::markup::{read_container, ContainerPayload};
use crate::persistence::StickyAssignments;
use crate::selector::{SelectionReason, VariantSelector};
use crate::visibility::apply_visibility;

/// What happened to one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerReport {
    pub optimization_id: Option<String>,
    pub optimization_name: Option<String>,
    pub winner: Option<String>,
    pub reason: Option<SelectionReason>,
    pub persisted: bool,
    pub emission: EmitOutcome,
}

impl ContainerReport {
    fn unresolved(optimization_id: Option<String>) -> Self {
        Self {
            optimization_id,
            optimization_name: None,
            winner: None,
            reason: None,
            persisted: false,
            emission: EmitOutcome::Skipped(SkipReason::Unresolved),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub containers: Vec<ContainerReport>,
}

impl ActivationReport {
    pub fn emitted(&self) -> usize {
        self.containers
            .iter()
            .filter(|c| c.emission.is_emitted())
            .count()
    }
}

pub struct OptimizeRuntime {
    document: Arc<dyn Document>,
    context: PageContext,
    sticky: StickyAssignments,
    selector: VariantSelector,
    emitter: EventEmitter,
    engine: EngineConfig,
    rng: Mutex<StdRng>,
    activated: AtomicBool,
}

impl OptimizeRuntime {
    pub fn new(
        config: &AppConfig,
        document: Arc<dyn Document>,
        context: PageContext,
        emitter: EventEmitter,
    ) -> Self {
        let sticky = StickyAssignments::new(
            context.local_storage_handle(),
            config.engine.storage_key_prefix.clone(),
        );
        Self {
            document,
            sticky,
            context,
            selector: VariantSelector::new(config.engine.force_variant_param.clone()),
            emitter,
            engine: config.engine.clone(),
            rng: Mutex::new(StdRng::from_entropy()),
            activated: AtomicBool::new(false),
        }
    }

    /// Replace the random source, e.g. with a seeded one for replays.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn sticky(&self) -> &StickyAssignments {
        &self.sticky
    }

    /// Waits for the first container, then processes every container once.
    ///
    /// Only the first call does any work; later calls return an empty report.
    pub async fn activate(&self) -> ActivationReport {
        if self.activated.swap(true, Ordering::SeqCst) {
            warn!("runtime already activated, ignoring");
            return ActivationReport::default();
        }

        let selector = self.engine.container_selector.as_str();
        wait_for_container(self.document.as_ref(), selector).await;

        let containers = self.document.query_all(selector);
        info!(count = containers.len(), "starting optimize for containers");

        ActivationReport {
            containers: containers
                .iter()
                .map(|container| self.run_container(container.as_ref()))
                .collect(),
        }
    }

    /// Runs the pipeline for a single container.
    pub fn run_container(&self, container: &dyn ContainerElement) -> ContainerReport {
        let payload = match read_container(
            container,
            &self.engine.variant_selector,
            self.engine.default_weight,
        ) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "container skipped");
                return ContainerReport::unresolved(None);
            }
        };

        if !payload.optimization.status {
            return self.run_inert(payload);
        }

        let optimization = &payload.optimization;
        let selection = {
            let mut rng = self.rng.lock();
            self.selector
                .select(optimization, &self.context, &self.sticky, &mut *rng)
        };
        let Some(selection) = selection else {
            return ContainerReport::unresolved(Some(optimization.id.clone()));
        };

        apply_visibility(&selection.variant_id, &payload.elements);

        let emission = match optimization.variant(&selection.variant_id) {
            Some(variant) => {
                let mut event =
                    ExperimentStarted::new(optimization.display_name(), variant.display_name());
                if selection.reason == SelectionReason::Preview {
                    event = event.as_preview();
                }
                self.emitter.emit(&event)
            }
            None => EmitOutcome::Skipped(SkipReason::Unresolved),
        };

        info!(
            optimization_id = %optimization.id,
            variant_id = %selection.variant_id,
            emission = ?emission,
            "optimization activated"
        );

        ContainerReport {
            optimization_id: Some(optimization.id.clone()),
            optimization_name: Some(optimization.display_name().to_string()),
            winner: Some(selection.variant_id),
            reason: Some(selection.reason),
            persisted: selection.persisted,
            emission,
        }
    }

    fn run_inert(&self, payload: ContainerPayload) -> ContainerReport {
        let optimization = payload.optimization;
        info!(
            optimization_id = %optimization.id,
            policy = ?self.engine.inert_policy,
            "optimization is not active"
        );

        let first = match self.engine.inert_policy {
            InertPolicy::ShowFirst => optimization.variants.first(),
            InertPolicy::Skip => None,
        };
        let (winner, reason) = match first {
            Some(first) if apply_visibility(&first.id, &payload.elements).is_some() => {
                (Some(first.id.clone()), Some(SelectionReason::InertDefault))
            }
            _ => (None, None),
        };

        ContainerReport {
            optimization_name: Some(optimization.display_name().to_string()),
            optimization_id: Some(optimization.id),
            winner,
            reason,
            persisted: false,
            emission: EmitOutcome::Skipped(SkipReason::Inert),
        }
    }
}
