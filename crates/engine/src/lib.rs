//! Content optimization engine — picks one variant per experiment container,
//! remembers the pick, shows it, and reports the exposure.
//!
//! # Modules
//!
//! - [`markup`] — Typed reading of container and variant data attributes
//! - [`persistence`] — Sticky per-optimization assignments in client storage
//! - [`selector`] — Preview > targeting > sticky > weighted random selection
//! - [`visibility`] — Shows the winning variant element, hides the rest
//! - [`gate`] — One-shot wait for the first container to appear
//! - [`runtime`] — Pipeline driver and activation report

pub mod gate;
pub mod markup;
pub mod persistence;
pub mod runtime;
pub mod selector;
pub mod visibility;

pub use persistence::StickyAssignments;
pub use runtime::{ActivationReport, ContainerReport, OptimizeRuntime};
pub use selector::{Selection, SelectionReason, VariantSelector};
