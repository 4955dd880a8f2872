//! End-to-end preload scenarios.
//!
//! Drives the scheduler through the public API the way a host shell does:
//! 1. Register the VULCA routes and their loaders
//! 2. Set up listeners on a document
//! 3. Dispatch interaction events / idle signals
//! 4. Check which loaders ran

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vulca_preload::prelude::*;
use vulca_preload::{
    Element, InteractionEvent, InteractionKind, ManualIdle, NeverIdle, PreloadError, RouteLoader,
};

const PAGE: &str = "https://vulca.example.com/";

/// Loader counting invocations; fails while `fail` is set.
#[derive(Default)]
struct ChunkLoader {
    calls: AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
}

impl ChunkLoader {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl RouteLoader for ChunkLoader {
    async fn load(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            Err(PreloadError::Network("Failed to fetch dynamically imported module".into()))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    scheduler: RoutePreloadScheduler,
    document: Arc<Document>,
    models: Arc<ChunkLoader>,
    vulca: Arc<ChunkLoader>,
}

fn harness(config: PreloadConfig) -> Harness {
    let models = Arc::new(ChunkLoader::default());
    let vulca = Arc::new(ChunkLoader::default());

    let registry = RouteLoaderRegistry::builder()
        .route("/models", "/models", models.clone())
        .unwrap()
        .route("/vulca", "/vulca", vulca.clone())
        .unwrap()
        .build();

    let scheduler = RoutePreloadScheduler::new(
        Arc::new(registry),
        Location::parse(PAGE).unwrap(),
        config,
    )
    .unwrap();

    Harness {
        scheduler,
        document: Arc::new(Document::new()),
        models,
        vulca,
    }
}

fn hover(href: &str) -> InteractionEvent {
    InteractionEvent::new(
        InteractionKind::PointerOver,
        vec![Element::new("span"), Element::link(href), Element::new("nav")],
    )
}

#[tokio::test]
async fn test_critical_preloads_scenario() {
    let h = harness(PreloadConfig::default());

    h.scheduler.trigger_all_critical_preloads();
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.models.calls(), 1);
    assert_eq!(h.vulca.calls(), 1);
    assert_eq!(
        h.scheduler.preloaded(),
        vec![RouteKey::new("/models"), RouteKey::new("/vulca")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_hover_same_origin_link_preloads_once() {
    let h = harness(PreloadConfig::default().with_idle_preload(false));
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));

    h.document.dispatch(&hover("/vulca"));
    h.document.dispatch(&hover("/vulca"));
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.vulca.calls(), 1);
    assert_eq!(h.models.calls(), 0);

    teardown.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_cross_origin_and_new_tab_links_ignored() {
    let h = harness(PreloadConfig::default().with_idle_preload(false));
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));

    h.document.dispatch(&hover("https://other.example.com/models"));

    let new_tab = InteractionEvent::on(
        InteractionKind::FocusIn,
        Element::link("/models").with_target("_blank"),
    );
    h.document.dispatch(&new_tab);
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.models.calls(), 0);
    assert!(h.scheduler.preloaded().is_empty());

    teardown.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_touch_on_hash_router_link() {
    let h = harness(PreloadConfig::default().with_idle_preload(false));
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));

    let touch = InteractionEvent::on(InteractionKind::TouchStart, Element::link("#/models/gpt-4"));
    h.document.dispatch(&touch);
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.models.calls(), 1);
    assert!(h.scheduler.is_preloaded(&RouteKey::new("/models")));

    teardown.teardown();
}

#[tokio::test]
async fn test_failed_preload_retried_on_next_hover() {
    let h = harness(PreloadConfig::default().with_idle_preload(false));
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));

    h.models.set_failing(true);
    h.document.dispatch(&hover("/models"));
    h.scheduler.wait_for_inflight().await;
    assert!(!h.scheduler.is_preloaded(&RouteKey::new("/models")));

    h.models.set_failing(false);
    h.document.dispatch(&hover("/models/leaderboard"));
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.models.calls(), 2);
    assert!(h.scheduler.is_preloaded(&RouteKey::new("/models")));

    h.document.dispatch(&hover("/models"));
    h.scheduler.wait_for_inflight().await;
    assert_eq!(h.models.calls(), 2);

    teardown.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_idle_signal_preloads_critical_routes() {
    let h = harness(PreloadConfig::default().with_critical_routes(["/vulca"]));
    let idle = Arc::new(ManualIdle::new());
    let teardown = h.scheduler.setup(&h.document, idle.clone());

    idle.signal_idle();
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.vulca.calls(), 1);
    assert_eq!(h.models.calls(), 0);

    teardown.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_idle_fallback_timer() {
    let h = harness(PreloadConfig::default().with_idle_timeout(Duration::from_millis(1500)));
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.scheduler.wait_for_inflight().await;
    assert_eq!(h.models.calls(), 0);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.scheduler.wait_for_inflight().await;
    assert_eq!(h.models.calls(), 1);
    assert_eq!(h.vulca.calls(), 1);

    teardown.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_teardown_reverses_setup() {
    let h = harness(PreloadConfig::default());
    let teardown = h.scheduler.setup(&h.document, Arc::new(NeverIdle));
    assert_eq!(h.document.listener_count(), 3);

    teardown.teardown();
    assert_eq!(h.document.listener_count(), 0);

    h.document.dispatch(&hover("/models"));
    h.document.dispatch(&InteractionEvent::on(
        InteractionKind::FocusIn,
        Element::link("/vulca"),
    ));
    tokio::time::sleep(Duration::from_secs(30)).await;
    h.scheduler.wait_for_inflight().await;

    assert_eq!(h.models.calls(), 0);
    assert_eq!(h.vulca.calls(), 0);
    assert_eq!(h.scheduler.stats().triggered, 0);
}
