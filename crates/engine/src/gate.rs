//! Activation gate — resolves once at least one element matching a selector
//! is in the document.
//!
//! Subscribes to insertion notifications rather than polling, resolves a single
//! time, then detaches. There is no timeout: a container that never appears
//! keeps the future pending.

use std::sync::Arc;

use optimize_core::dom::{Document, ObserverId};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

pub async fn wait_for_container(document: &dyn Document, selector: &str) {
    if !document.query_all(selector).is_empty() {
        return;
    }

    let (tx, rx) = oneshot::channel::<()>();
    let tx = Mutex::new(Some(tx));
    let watched = selector.to_string();
    let observer = document.observe(Arc::new(move |doc: &dyn Document| {
        if doc.query_all(&watched).is_empty() {
            return;
        }
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(());
        }
    }));
    let _guard = Detach {
        document,
        observer,
    };
    debug!(selector, observer, "waiting for container");

    // A container may have been inserted between the first query and `observe`.
    if document.query_all(selector).is_empty() {
        let _ = rx.await;
    }
    debug!(selector, "container available");
}

/// Disconnects the observer when the wait resolves or is dropped.
struct Detach<'a> {
    document: &'a dyn Document,
    observer: ObserverId,
}

impl Drop for Detach<'_> {
    fn drop(&mut self) {
        self.document.disconnect(self.observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimize_core::dom::{ContainerSnapshot, MemoryContainer, MemoryDocument};
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_immediately_when_present() {
        let doc = MemoryDocument::new();
        doc.insert(Arc::new(MemoryContainer::new()));

        wait_for_container(&doc, ".gp-optimize-container").await;
        assert_eq!(doc.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_resolves_on_late_insertion_and_detaches() {
        let doc = Arc::new(MemoryDocument::new());

        let inserter = doc.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            // Unrelated content does not resolve the wait.
            let unrelated: ContainerSnapshot =
                serde_json::from_str(r#"{"classes":["wp-block-group"]}"#).unwrap();
            inserter.insert(Arc::new(MemoryContainer::from(unrelated)));
            tokio::time::sleep(Duration::from_millis(20)).await;
            inserter.insert(Arc::new(MemoryContainer::new()));
        });

        tokio::time::timeout(
            Duration::from_secs(2),
            wait_for_container(doc.as_ref(), ".gp-optimize-container"),
        )
        .await
        .expect("container wait should resolve");
        handle.await.expect("inserter task");

        assert_eq!(doc.query_all(".gp-optimize-container").len(), 1);
        assert_eq!(doc.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_never_resolves_without_container() {
        let doc = MemoryDocument::new();
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            wait_for_container(&doc, ".gp-optimize-container"),
        )
        .await;
        assert!(waited.is_err());
        // Dropping the pending wait detaches its observer.
        assert_eq!(doc.observer_count(), 0);
    }
}
