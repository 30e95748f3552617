//! Targeting rules — decides whether a variant's conditionals force it.
//!
//! # Modules
//!
//! - [`context`] — Page context (query string, local and session storage)
//! - [`operators`] — Comparison operators per stored data shape
//! - [`evaluator`] — Conditional evaluation against a page context

pub mod context;
pub mod evaluator;
pub mod operators;

pub use context::PageContext;
pub use evaluator::RuleEvaluator;
