//! Document abstraction — experiment containers, variant elements, and
//! insertion notifications.
//!
//! Elements expose their `data-*` attributes by camelCase key (`optimizationId`,
//! `variantId`, ...). [`MemoryDocument`] is the in-process implementation used
//! by page replays and tests; it understands class selectors only.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Inline `display` style of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    /// No inline style set.
    #[default]
    Unset,
    Block,
    None,
}

pub trait VariantElement: Send + Sync {
    fn data(&self, key: &str) -> Option<String>;
    fn display(&self) -> Display;
    fn set_display(&self, display: Display);
}

pub trait ContainerElement: Send + Sync {
    fn data(&self, key: &str) -> Option<String>;
    /// Variant elements below this container matching `selector`, in document order.
    fn variants(&self, selector: &str) -> Vec<Arc<dyn VariantElement>>;
}

pub type ObserverId = u64;

/// Invoked after every subtree insertion.
pub type MutationCallback = Arc<dyn Fn(&dyn Document) + Send + Sync>;

pub trait Document: Send + Sync {
    /// Containers matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Arc<dyn ContainerElement>>;
    fn observe(&self, callback: MutationCallback) -> ObserverId;
    fn disconnect(&self, id: ObserverId);
}

fn matches_selector(classes: &[String], selector: &str) -> bool {
    let Some(rest) = selector.trim().strip_prefix('.') else {
        return false;
    };
    rest.split('.')
        .all(|class| !class.is_empty() && classes.iter().any(|c| c == class))
}

// ─── In-memory document ─────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryVariant {
    classes: Vec<String>,
    data: BTreeMap<String, String>,
    display: Mutex<Display>,
}

impl MemoryVariant {
    pub fn new() -> Self {
        Self {
            classes: vec!["gp-optimize-variant".to_string()],
            data: BTreeMap::new(),
            display: Mutex::new(Display::Unset),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl Default for MemoryVariant {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantElement for MemoryVariant {
    fn data(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn display(&self) -> Display {
        *self.display.lock()
    }

    fn set_display(&self, display: Display) {
        *self.display.lock() = display;
    }
}

#[derive(Debug)]
pub struct MemoryContainer {
    classes: Vec<String>,
    data: BTreeMap<String, String>,
    variants: Vec<Arc<MemoryVariant>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self {
            classes: vec!["gp-optimize-container".to_string()],
            data: BTreeMap::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_variant(mut self, variant: Arc<MemoryVariant>) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn memory_variants(&self) -> &[Arc<MemoryVariant>] {
        &self.variants
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerElement for MemoryContainer {
    fn data(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn variants(&self, selector: &str) -> Vec<Arc<dyn VariantElement>> {
        self.variants
            .iter()
            .filter(|v| matches_selector(&v.classes, selector))
            .map(|v| v.clone() as Arc<dyn VariantElement>)
            .collect()
    }
}

/// In-memory document that notifies observers after each insertion.
#[derive(Default)]
pub struct MemoryDocument {
    containers: RwLock<Vec<Arc<MemoryContainer>>>,
    observers: Mutex<Vec<(ObserverId, MutationCallback)>>,
    next_observer: AtomicU64,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a container and notifies every registered observer.
    pub fn insert(&self, container: Arc<MemoryContainer>) {
        self.containers.write().push(container);

        // Callbacks may query or disconnect, so no lock is held while they run.
        let observers: Vec<MutationCallback> = self
            .observers
            .lock()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in observers {
            callback(self);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn containers(&self) -> Vec<Arc<MemoryContainer>> {
        self.containers.read().clone()
    }
}

impl Document for MemoryDocument {
    fn query_all(&self, selector: &str) -> Vec<Arc<dyn ContainerElement>> {
        self.containers
            .read()
            .iter()
            .filter(|c| matches_selector(&c.classes, selector))
            .map(|c| c.clone() as Arc<dyn ContainerElement>)
            .collect()
    }

    fn observe(&self, callback: MutationCallback) -> ObserverId {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().push((id, callback));
        id
    }

    fn disconnect(&self, id: ObserverId) {
        self.observers.lock().retain(|(observer, _)| *observer != id);
    }
}

// ─── Snapshots ──────────────────────────────────────────────────────────────

/// Serialized form of a container, as captured from rendered markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    #[serde(default = "default_container_classes")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub variants: Vec<VariantSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSnapshot {
    #[serde(default = "default_variant_classes")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

fn default_container_classes() -> Vec<String> {
    vec!["gp-optimize-container".to_string()]
}

fn default_variant_classes() -> Vec<String> {
    vec!["gp-optimize-variant".to_string()]
}

impl From<ContainerSnapshot> for MemoryContainer {
    fn from(snapshot: ContainerSnapshot) -> Self {
        Self {
            classes: snapshot.classes,
            data: snapshot.data,
            variants: snapshot
                .variants
                .into_iter()
                .map(|v| {
                    Arc::new(MemoryVariant {
                        classes: v.classes,
                        data: v.data,
                        display: Mutex::new(Display::Unset),
                    })
                })
                .collect(),
        }
    }
}
