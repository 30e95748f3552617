//! Reads the experiment payload rendered into a container's data attributes
//! and turns it into the typed [`Optimization`] model.
//!
//! This is the only place that touches raw attribute strings. Malformed parts
//! degrade locally: bad weights become the default weight, bad conditional
//! payloads become "no conditionals", variants without an id are skipped.

use std::sync::Arc;

use optimize_core::dom::{ContainerElement, VariantElement};
use optimize_core::error::{OptimizeError, OptimizeResult};
use optimize_core::types::{is_valid_name, parse_weight, Conditional, Optimization, Variant};
use tracing::warn;

pub const STATUS_ATTR: &str = "status";
pub const OPTIMIZATION_ID_ATTR: &str = "optimizationId";
pub const OPTIMIZATION_NAME_ATTR: &str = "optimizationName";
pub const VARIANT_ID_ATTR: &str = "variantId";
pub const VARIANT_NAME_ATTR: &str = "variantName";
pub const TARGET_PERCENTAGE_ATTR: &str = "targetPercentage";
pub const CONDITIONALS_ATTR: &str = "conditionals";

/// A container's optimization together with its live variant elements.
pub struct ContainerPayload {
    pub optimization: Optimization,
    pub elements: Vec<Arc<dyn VariantElement>>,
}

pub fn read_container(
    container: &dyn ContainerElement,
    variant_selector: &str,
    default_weight: u32,
) -> OptimizeResult<ContainerPayload> {
    let id = container
        .data(OPTIMIZATION_ID_ATTR)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| OptimizeError::MissingAttribute(OPTIMIZATION_ID_ATTR.into()))?;

    let name = container.data(OPTIMIZATION_NAME_ATTR);
    if let Some(name) = name.as_deref() {
        if !is_valid_name(name) {
            warn!(optimization_id = %id, name, "optimization name has unsupported characters");
        }
    }

    let elements = container.variants(variant_selector);
    let variants = elements
        .iter()
        .filter_map(|el| read_variant(el.as_ref(), &id, default_weight))
        .collect();

    Ok(ContainerPayload {
        optimization: Optimization {
            id,
            name,
            status: container.data(STATUS_ATTR).as_deref() == Some("true"),
            variants,
        },
        elements,
    })
}

fn read_variant(
    element: &dyn VariantElement,
    optimization_id: &str,
    default_weight: u32,
) -> Option<Variant> {
    let Some(id) = element.data(VARIANT_ID_ATTR).filter(|id| !id.trim().is_empty()) else {
        warn!(optimization_id, "variant element without id skipped");
        return None;
    };

    let name = element.data(VARIANT_NAME_ATTR);
    if let Some(name) = name.as_deref() {
        if !is_valid_name(name) {
            warn!(optimization_id, variant_id = %id, name, "variant name has unsupported characters");
        }
    }

    let conditionals = match element.data(CONDITIONALS_ATTR) {
        None => Vec::new(),
        Some(raw) if raw.trim().is_empty() => Vec::new(),
        Some(raw) => Conditional::parse_list(&raw).unwrap_or_else(|e| {
            warn!(
                optimization_id,
                variant_id = %id,
                error = %e,
                "unreadable conditionals ignored"
            );
            Vec::new()
        }),
    };

    Some(Variant {
        name,
        target_percentage: parse_weight(
            element.data(TARGET_PERCENTAGE_ATTR).as_deref(),
            default_weight,
        ),
        conditionals,
        id,
    })
}
