//! Sticky assignments — the variant a visitor was given for an optimization,
//! kept in durable client storage under `<prefix><optimizationId>`.
//!
//! Entries never expire; they disappear only when cleared here or when the
//! visitor clears their storage.

use std::sync::Arc;

use optimize_core::error::OptimizeResult;
use optimize_core::storage::KeyValueStore;
use tracing::debug;

pub struct StickyAssignments {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl StickyAssignments {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, optimization_id: &str) -> String {
        format!("{}{}", self.prefix, optimization_id)
    }

    pub fn get(&self, optimization_id: &str) -> OptimizeResult<Option<String>> {
        self.store.get(&self.key(optimization_id))
    }

    pub fn set(&self, optimization_id: &str, variant_id: &str) -> OptimizeResult<()> {
        let key = self.key(optimization_id);
        self.store.set(&key, variant_id)?;
        debug!(key = %key, variant_id, "sticky assignment stored");
        Ok(())
    }

    pub fn clear(&self, optimization_id: &str) -> OptimizeResult<()> {
        self.store.remove(&self.key(optimization_id))
    }
}
