//! Integration tests for startup reconciliation of screenshot nodes

use super::test_utils::{FakeMaterializer, FakeScreenshotService, FAR_FUTURE};
use chrono::{TimeZone, Utc};
use screenshot_transformer::clock::FixedClock;
use screenshot_transformer::config::PluginOptions;
use screenshot_transformer::error::CaptureError;
use screenshot_transformer::host::{HostContext, NodeStore};
use screenshot_transformer::ids::NamespacedIdGenerator;
use screenshot_transformer::node::{Node, ScreenshotNode, SCREENSHOT_FILE_FIELD};
use screenshot_transformer::store::{MemoryCache, MemoryNodeStore};
use screenshot_transformer::types::{NodeId, SCREENSHOT_TYPE};
use screenshot_transformer::ScreenshotPlugin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const NOW: &str = "2024-06-01T00:00:00Z";

fn screenshot(parent: &str, url: &str, expires: &str) -> Node {
    ScreenshotNode::new(
        NodeId::new(format!("{} >>> Screenshot", parent)),
        url.to_string(),
        expires.to_string(),
        NodeId::from(parent),
        NodeId::new(format!("file-{}", parent)),
        None,
    )
    .unwrap()
    .to_node()
    .unwrap()
}

fn plugin(service: Arc<FakeScreenshotService>) -> ScreenshotPlugin {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    ScreenshotPlugin::new(
        PluginOptions::default(),
        service,
        Arc::new(FakeMaterializer::new()),
    )
    .with_clock(Arc::new(FixedClock::new(now)))
}

#[tokio::test]
async fn test_expired_screenshot_is_recaptured() {
    let store = MemoryNodeStore::with_nodes([
        Node::new("site-a", "SitesYaml").with_field("url", "https://a.example"),
        screenshot("site-a", "https://a.example", "2024-05-31T23:59:59Z"),
    ]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE));
    let plugin = plugin(service.clone());

    let summary = plugin
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await
        .unwrap();

    assert_eq!(service.calls(), vec!["https://a.example".to_string()]);
    assert_eq!(summary.refreshed, vec![NodeId::from("site-a >>> Screenshot")]);
    assert!(summary.touched.is_empty());
    assert!(store.touched().is_empty());

    let refreshed = store
        .get_node(&NodeId::from("site-a >>> Screenshot"))
        .unwrap()
        .unwrap();
    let refreshed = ScreenshotNode::try_from(&refreshed).unwrap();
    assert_eq!(refreshed.expires, FAR_FUTURE);
    assert_eq!(refreshed.parent, NodeId::from("site-a"));
    assert_eq!(store.nodes_of_type(SCREENSHOT_TYPE).len(), 1);
}

#[tokio::test]
async fn test_live_screenshot_touches_file() {
    let no_expiry = Node::new("site-none >>> Screenshot", SCREENSHOT_TYPE)
        .with_parent("site-none")
        .with_field("url", "https://none.example")
        .with_field(SCREENSHOT_FILE_FIELD, "file-site-none");
    let store = MemoryNodeStore::with_nodes([
        screenshot("site-now", "https://now.example", NOW),
        screenshot("site-later", "https://later.example", FAR_FUTURE),
        screenshot("site-garbled", "https://garbled.example", "whenever"),
        no_expiry,
    ]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE));
    let plugin = plugin(service.clone());

    let summary = plugin
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await
        .unwrap();

    // Expiry exactly at "now", a missing expiry and an unreadable one are all live
    assert!(service.calls().is_empty());
    assert!(summary.refreshed.is_empty());
    assert_eq!(summary.touched.len(), 4);

    let touched = store.touched();
    for file in ["file-site-now", "file-site-later", "file-site-garbled", "file-site-none"] {
        assert!(touched.contains(&NodeId::from(file)), "{} should be touched", file);
    }
}

#[tokio::test]
async fn test_non_screenshot_nodes_are_ignored() {
    let store = MemoryNodeStore::with_nodes([
        Node::new("site-a", "SitesYaml")
            .with_field("url", "https://a.example")
            .with_field("expires", "2000-01-01T00:00:00Z"),
        Node::new("f", "File").with_field("expires", "2000-01-01T00:00:00Z"),
    ]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE));

    let summary = plugin(service.clone())
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await
        .unwrap();

    assert_eq!(summary, Default::default());
    assert!(service.calls().is_empty());
    assert!(store.touched().is_empty());
}

#[tokio::test]
async fn test_reconciliation_runs_all_records_concurrently() {
    let n = 4;
    let nodes: Vec<Node> = (0..n)
        .map(|i| {
            screenshot(
                &format!("site-{}", i),
                &format!("https://{}.example", i),
                "2020-01-01T00:00:00Z",
            )
        })
        .collect();
    let store = MemoryNodeStore::with_nodes(nodes);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");

    // Each capture blocks until all n are in flight; a sequential loop would hang
    let service = Arc::new(
        FakeScreenshotService::new(FAR_FUTURE).with_barrier(Arc::new(Barrier::new(n))),
    );
    let plugin = plugin(service.clone());

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        plugin.on_pre_bootstrap(HostContext::new(&store, &cache, &ids)),
    )
    .await
    .expect("reconciliation should not deadlock")
    .unwrap();

    assert_eq!(summary.refreshed.len(), n);
    assert_eq!(service.calls().len(), n);
}

#[tokio::test]
async fn test_one_failure_fails_the_batch() {
    let store = MemoryNodeStore::with_nodes([
        screenshot("site-ok", "https://ok.example", "2020-01-01T00:00:00Z"),
        screenshot("site-down", "https://down.example", "2020-01-01T00:00:00Z"),
        screenshot("site-live", "https://live.example", FAR_FUTURE),
    ]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE).failing_for("https://down.example"));

    let result = plugin(service)
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await;

    assert!(matches!(
        result,
        Err(CaptureError::UpstreamStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_expired_screenshot_without_parent_is_an_error() {
    let orphan = Node::new("orphan >>> Screenshot", SCREENSHOT_TYPE)
        .with_field("url", "https://orphan.example")
        .with_field("expires", "2020-01-01T00:00:00Z");
    let store = MemoryNodeStore::with_nodes([orphan]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE));

    let result = plugin(service.clone())
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await;

    assert!(matches!(
        result,
        Err(CaptureError::IncompleteNode { field: "parent", .. })
    ));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_live_screenshot_without_file_is_reported() {
    let bare = Node::new("bare >>> Screenshot", SCREENSHOT_TYPE)
        .with_parent("bare")
        .with_field("url", "https://bare.example")
        .with_field("expires", FAR_FUTURE);
    let store = MemoryNodeStore::with_nodes([bare]);
    let cache = MemoryCache::new();
    let ids = NamespacedIdGenerator::new("test");
    let service = Arc::new(FakeScreenshotService::new(FAR_FUTURE));

    let summary = plugin(service)
        .on_pre_bootstrap(HostContext::new(&store, &cache, &ids))
        .await
        .unwrap();

    assert_eq!(summary.unreferenced, vec![NodeId::from("bare >>> Screenshot")]);
    assert!(store.touched().is_empty());
}
