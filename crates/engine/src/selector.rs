//! Variant selection.
//!
//! Priority, evaluated once per activation:
//! 1. `force_variant` preview override (never persisted)
//! 2. first conditional that holds, scanning variants then conditionals in
//!    declaration order
//! 3. sticky assignment, if it still names a current variant
//! 4. weighted random draw
//!
//! Results of steps 2-4 are written back as the sticky assignment.

use optimize_core::types::Optimization;
use optimize_targeting::{PageContext, RuleEvaluator};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::persistence::StickyAssignments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Preview,
    Targeted,
    Sticky,
    Weighted,
    /// Experiment switched off; the first variant is shown.
    InertDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub variant_id: String,
    pub reason: SelectionReason,
    pub persisted: bool,
}

pub struct VariantSelector {
    evaluator: RuleEvaluator,
    force_variant_param: String,
}

impl VariantSelector {
    pub fn new(force_variant_param: impl Into<String>) -> Self {
        Self {
            evaluator: RuleEvaluator::new(),
            force_variant_param: force_variant_param.into(),
        }
    }

    /// Picks the winning variant, or `None` when the optimization has no variants.
    pub fn select<R: Rng + ?Sized>(
        &self,
        optimization: &Optimization,
        ctx: &PageContext,
        sticky: &StickyAssignments,
        rng: &mut R,
    ) -> Option<Selection> {
        if optimization.variants.is_empty() {
            warn!(optimization_id = %optimization.id, "optimization has no variants");
            return None;
        }

        if let Some(forced) = ctx.query_param(&self.force_variant_param) {
            if optimization.contains_variant(forced) {
                info!(
                    optimization_id = %optimization.id,
                    variant_id = forced,
                    "variant forced by preview parameter"
                );
                return Some(Selection {
                    variant_id: forced.to_string(),
                    reason: SelectionReason::Preview,
                    persisted: false,
                });
            }
            debug!(
                optimization_id = %optimization.id,
                variant_id = forced,
                "preview parameter names no current variant, ignored"
            );
        }

        let (variant_id, reason) = self
            .targeted(optimization, ctx)
            .map(|id| (id, SelectionReason::Targeted))
            .or_else(|| {
                self.stored(optimization, sticky)
                    .map(|id| (id, SelectionReason::Sticky))
            })
            .unwrap_or_else(|| (self.weighted(optimization, rng), SelectionReason::Weighted));

        let persisted = match sticky.set(&optimization.id, &variant_id) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    optimization_id = %optimization.id,
                    error = %e,
                    "could not store sticky assignment"
                );
                false
            }
        };

        info!(
            optimization_id = %optimization.id,
            variant_id = %variant_id,
            reason = ?reason,
            "winning variant selected"
        );

        Some(Selection {
            variant_id,
            reason,
            persisted,
        })
    }

    fn targeted(&self, optimization: &Optimization, ctx: &PageContext) -> Option<String> {
        optimization.variants.iter().find_map(|variant| {
            let conditional = self.evaluator.first_match(&variant.conditionals, ctx)?;
            debug!(
                variant_id = %variant.id,
                key = %conditional.conditional_key,
                operator = ?conditional.operator,
                value = %conditional.value,
                "variant forced by conditional"
            );
            Some(variant.id.clone())
        })
    }

    fn stored(&self, optimization: &Optimization, sticky: &StickyAssignments) -> Option<String> {
        match sticky.get(&optimization.id) {
            Ok(Some(stored)) if optimization.contains_variant(&stored) => {
                debug!(variant_id = %stored, "found stored variant");
                Some(stored)
            }
            Ok(Some(stale)) => {
                debug!(variant_id = %stale, "stored variant no longer exists, ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read sticky assignment");
                None
            }
        }
    }

    fn weighted<R: Rng + ?Sized>(&self, optimization: &Optimization, rng: &mut R) -> String {
        let weights: Vec<u32> = optimization
            .variants
            .iter()
            .map(|v| v.target_percentage)
            .collect();
        let index = weighted_choice(&weights, rng).unwrap_or(0);
        debug!(?weights, index, "variant chosen by weighted random");
        optimization.variants[index].id.clone()
    }
}

/// Index of a weighted random pick: a uniform draw in `[0, total)` lands on the
/// first entry whose cumulative weight exceeds it, so zero weights are never
/// picked. All-zero weights fall back to the first entry; an empty slice
/// yields `None`.
pub fn weighted_choice<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    if total == 0 {
        return Some(0);
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    weights.iter().position(|w| {
        cumulative += u64::from(*w);
        cumulative > draw
    })
}
