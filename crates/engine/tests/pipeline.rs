//! End-to-end page loads: markup in, visibility + storage + analytics out.

use std::sync::Arc;
use std::time::Duration;

use optimize_core::config::{AppConfig, SinkKind};
use optimize_core::dom::{Display, MemoryContainer, MemoryDocument, MemoryVariant, VariantElement};
use optimize_core::storage::{KeyValueStore, MemoryStore, UnavailableStore};
use optimize_core::tracking::{capture_data_layer, capture_tracker, CaptureDataLayer, CaptureTracker};
use optimize_engine::{OptimizeRuntime, SelectionReason};
use optimize_targeting::PageContext;
use optimize_web_sdk::{EmitOutcome, EventEmitter, SkipReason};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Page {
    runtime: OptimizeRuntime,
    tracker: Arc<CaptureTracker>,
    data_layer: Arc<CaptureDataLayer>,
}

fn config(kind: SinkKind) -> AppConfig {
    let mut config = AppConfig::default();
    config.tracking.event_type = kind;
    config.tracking.datalayer_event_name = "gp_experiment".into();
    config
}

fn load_page(
    config: &AppConfig,
    doc: Arc<MemoryDocument>,
    url: &str,
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    seed: u64,
) -> Page {
    let tracker = capture_tracker();
    let data_layer = capture_data_layer();
    let emitter = EventEmitter::new(Arc::new(config.clone()), data_layer.clone())
        .with_tracker(tracker.clone());
    let ctx = PageContext::new(url, local, session);
    let runtime = OptimizeRuntime::new(config, doc, ctx, emitter)
        .with_rng(StdRng::seed_from_u64(seed));
    Page {
        runtime,
        tracker,
        data_layer,
    }
}

fn variant(id: &str, weight: &str) -> Arc<MemoryVariant> {
    Arc::new(
        MemoryVariant::new()
            .with_data("variantId", id)
            .with_data("variantName", format!("Variant {id}"))
            .with_data("targetPercentage", weight),
    )
}

fn experiment(id: &str, variants: &[Arc<MemoryVariant>]) -> Arc<MemoryContainer> {
    Arc::new(variants.iter().fold(
        MemoryContainer::new()
            .with_data("status", "true")
            .with_data("optimizationId", id)
            .with_data("optimizationName", format!("Experiment {id}")),
        |c, v| c.with_variant(v.clone()),
    ))
}

fn visible(variants: &[Arc<MemoryVariant>]) -> Vec<usize> {
    variants
        .iter()
        .enumerate()
        .filter(|(_, v)| v.display() == Display::Block)
        .map(|(i, _)| i)
        .collect()
}

#[tokio::test]
async fn selection_sticks_across_page_loads() {
    let local: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let config = config(SinkKind::Mixpanel);
    let mut winners = Vec::new();

    for seed in 0..5 {
        let doc = Arc::new(MemoryDocument::new());
        let variants = vec![variant("a", "50"), variant("b", "50"), variant("c", "50")];
        doc.insert(experiment("opt-1", &variants));

        let page = load_page(
            &config,
            doc,
            "https://example.org/",
            local.clone(),
            Arc::new(MemoryStore::new()),
            seed,
        );
        let report = page.runtime.activate().await;
        assert_eq!(visible(&variants).len(), 1);
        assert_eq!(page.tracker.count(), 1);
        winners.push(report.containers[0].winner.clone().unwrap());
        if seed > 0 {
            assert_eq!(report.containers[0].reason, Some(SelectionReason::Sticky));
        }
    }

    assert!(winners.windows(2).all(|w| w[0] == w[1]), "winners: {winners:?}");
}

#[tokio::test]
async fn url_conditional_beats_weight() {
    let config = config(SinkKind::Datalayer);
    let doc = Arc::new(MemoryDocument::new());
    let forced = Arc::new(
        MemoryVariant::new()
            .with_data("variantId", "b")
            .with_data("variantName", "Ads landing")
            .with_data("targetPercentage", "0")
            .with_data(
                "conditionals",
                r#"[{"type":"url_parameter","conditionalKey":"src","operator":"is","value":"ads"}]"#,
            ),
    );
    let variants = vec![variant("a", "100"), forced];
    doc.insert(experiment("opt-1", &variants));

    let page = load_page(
        &config,
        doc,
        "https://example.org/petition?src=ads",
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        1,
    );
    let report = page.runtime.activate().await;

    assert_eq!(report.containers[0].reason, Some(SelectionReason::Targeted));
    assert_eq!(visible(&variants), vec![1]);
    assert_eq!(page.tracker.count(), 0);
    assert_eq!(
        page.data_layer.entries(),
        vec![serde_json::json!({
            "event": "gp_experiment",
            "experiment_name": "Experiment opt-1",
            "variant_name": "Ads landing",
        })]
    );
}

#[tokio::test]
async fn storage_conditionals_force_variants() {
    let config = config(SinkKind::Mixpanel);
    let doc = Arc::new(MemoryDocument::new());
    let vip = Arc::new(
        MemoryVariant::new().with_data("variantId", "vip").with_data(
            "conditionals",
            r#"[{"type":"local_storage","nameInStorage":"tags","dataType":"comma_separated","operator":"contains","value":"vip"}]"#,
        ),
    );
    let pro = Arc::new(
        MemoryVariant::new().with_data("variantId", "pro").with_data(
            "conditionals",
            r#"[{"type":"session_storage","nameInStorage":"gp_optimize_data","dataType":"object","conditionalKey":"plan","operator":"is","value":"pro"}]"#,
        ),
    );
    let first = vec![variant("base", "100"), vip.clone(), pro.clone()];
    let second = vec![variant("base", "100"), vip, pro];
    doc.insert(experiment("opt-vip", &first));

    let local = Arc::new(MemoryStore::new().with_entry("tags", "new,returning"));
    let session = Arc::new(MemoryStore::new().with_entry("gp_optimize_data", r#"{"plan":"pro"}"#));
    let page = load_page(&config, doc, "https://example.org/", local, session, 2);
    let report = page.runtime.activate().await;
    assert_eq!(report.containers[0].winner.as_deref(), Some("pro"));

    // Same markup with a vip visitor; the earlier variant wins.
    let doc = Arc::new(MemoryDocument::new());
    doc.insert(experiment("opt-vip", &second));
    let local = Arc::new(MemoryStore::new().with_entry("tags", "new, vip, returning"));
    let session = Arc::new(MemoryStore::new().with_entry("gp_optimize_data", "{not json"));
    let page = load_page(&config, doc, "https://example.org/", local, session, 2);
    let report = page.runtime.activate().await;
    assert_eq!(report.containers[0].winner.as_deref(), Some("vip"));
}

#[tokio::test]
async fn preview_override_wins_and_is_not_stored() {
    let config = config(SinkKind::Mixpanel);
    let doc = Arc::new(MemoryDocument::new());
    let variants = vec![variant("a", "100"), variant("b", "0")];
    doc.insert(experiment("opt-1", &variants));
    let local = Arc::new(MemoryStore::new().with_entry("gp-optimize-opt-1", "a"));

    let page = load_page(
        &config,
        doc,
        "https://example.org/?force_variant=b",
        local.clone(),
        Arc::new(MemoryStore::new()),
        3,
    );
    let report = page.runtime.activate().await;

    assert_eq!(report.containers[0].reason, Some(SelectionReason::Preview));
    assert_eq!(visible(&variants), vec![1]);
    assert_eq!(local.get("gp-optimize-opt-1").unwrap().as_deref(), Some("a"));
}

#[tokio::test]
async fn containers_are_independent_but_share_sticky_ids() {
    let config = config(SinkKind::Mixpanel);
    let doc = Arc::new(MemoryDocument::new());
    let header = vec![variant("h1", "50"), variant("h2", "50")];
    let footer = vec![variant("f1", "0"), variant("f2", "100")];
    let header_again = vec![variant("h1", "50"), variant("h2", "50")];
    doc.insert(experiment("header", &header));
    doc.insert(experiment("footer", &footer));
    doc.insert(experiment("header", &header_again));

    let local = Arc::new(MemoryStore::new());
    let page = load_page(
        &config,
        doc,
        "https://example.org/",
        local.clone(),
        Arc::new(MemoryStore::new()),
        4,
    );
    let report = page.runtime.activate().await;

    assert_eq!(report.containers.len(), 3);
    assert_eq!(report.emitted(), 3);
    assert_eq!(page.tracker.count(), 3);
    assert_eq!(report.containers[1].winner.as_deref(), Some("f2"));
    assert_eq!(report.containers[0].winner, report.containers[2].winner);
    assert_eq!(report.containers[2].reason, Some(SelectionReason::Sticky));
    assert_eq!(local.len(), 2);
}

#[tokio::test]
async fn late_inserted_container_activates_once() {
    let config = config(SinkKind::Mixpanel);
    let doc = Arc::new(MemoryDocument::new());
    let variants = vec![variant("a", "0"), variant("b", "100")];

    let page = load_page(
        &config,
        doc.clone(),
        "https://example.org/",
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        5,
    );

    let late = experiment("opt-late", &variants);
    let inserter = doc.clone();
    let insert = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        inserter.insert(late);
    });

    let report = tokio::time::timeout(Duration::from_secs(2), page.runtime.activate())
        .await
        .expect("activation should resolve after insertion");
    insert.await.expect("inserter task");

    assert_eq!(report.containers.len(), 1);
    assert_eq!(visible(&variants), vec![1]);
    assert_eq!(page.tracker.count(), 1);
    assert_eq!(doc.observer_count(), 0);

    // Content inserted afterwards is not picked up by a second run.
    doc.insert(experiment("opt-later", &[variant("x", "100")]));
    assert!(page.runtime.activate().await.containers.is_empty());
    assert_eq!(page.tracker.count(), 1);
}

#[tokio::test]
async fn missing_collaborators_do_not_block_display() {
    let config = config(SinkKind::Mixpanel);
    let doc = Arc::new(MemoryDocument::new());
    let variants = vec![variant("a", "100"), variant("b", "0")];
    doc.insert(experiment("opt-1", &variants));

    let data_layer = capture_data_layer();
    // No tracking client on the page, storage blocked.
    let emitter = EventEmitter::new(Arc::new(config.clone()), data_layer.clone());
    let ctx = PageContext::new(
        "https://example.org/",
        Arc::new(UnavailableStore),
        Arc::new(UnavailableStore),
    );
    let runtime = OptimizeRuntime::new(&config, doc, ctx, emitter)
        .with_rng(StdRng::seed_from_u64(6));
    let report = runtime.activate().await;

    let c = &report.containers[0];
    assert_eq!(c.winner.as_deref(), Some("a"));
    assert!(!c.persisted);
    assert_eq!(c.emission, EmitOutcome::Skipped(SkipReason::TrackerMissing));
    assert_eq!(visible(&variants), vec![0]);
    assert_eq!(data_layer.count(), 0);
}
