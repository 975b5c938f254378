//! Integration tests for the node-creation hook

use super::test_utils::{FakeMaterializer, FakeScreenshotService, FAR_FUTURE};
use screenshot_transformer::config::PluginOptions;
use screenshot_transformer::digest::DIGEST_HEX_LEN;
use screenshot_transformer::error::CaptureError;
use screenshot_transformer::host::{HostContext, NodeStore};
use screenshot_transformer::ids::{IdGenerator, NamespacedIdGenerator};
use screenshot_transformer::node::{Node, ScreenshotNode, SCREENSHOT_FILE_FIELD};
use screenshot_transformer::store::{MemoryCache, MemoryNodeStore};
use screenshot_transformer::types::{NodeId, FILE_TYPE, SCREENSHOT_TYPE};
use screenshot_transformer::ScreenshotPlugin;
use std::sync::Arc;

struct Harness {
    store: MemoryNodeStore,
    cache: MemoryCache,
    ids: NamespacedIdGenerator,
    service: Arc<FakeScreenshotService>,
    materializer: Arc<FakeMaterializer>,
    plugin: ScreenshotPlugin,
}

impl Harness {
    fn new(service: FakeScreenshotService, source_kind: &str) -> Self {
        let service = Arc::new(service);
        let materializer = Arc::new(FakeMaterializer::new());
        let options = PluginOptions {
            source_kind: source_kind.to_string(),
            ..PluginOptions::default()
        };
        let plugin = ScreenshotPlugin::new(options, service.clone(), materializer.clone());
        Self {
            store: MemoryNodeStore::new(),
            cache: MemoryCache::new(),
            ids: NamespacedIdGenerator::new("test"),
            service,
            materializer,
            plugin,
        }
    }

    fn host(&self) -> HostContext<'_> {
        HostContext::new(&self.store, &self.cache, &self.ids)
    }

    fn add(&self, node: Node) -> Node {
        self.store.create_node(node.clone()).unwrap();
        node
    }
}

#[tokio::test]
async fn test_site_node_gets_linked_screenshot() {
    let harness = Harness::new(
        FakeScreenshotService::new(FAR_FUTURE).with_image("https://example.com", "https://cdn/img.png"),
        "site",
    );
    let site = harness.add(Node::new("site-1", "site").with_field("url", "https://example.com"));

    let screenshot = harness
        .plugin
        .on_create_node(&site, harness.host())
        .await
        .unwrap()
        .expect("site node should be captured");

    assert_eq!(screenshot.url, "https://example.com");
    assert_eq!(screenshot.expires, FAR_FUTURE);
    assert_eq!(screenshot.parent, NodeId::from("site-1"));
    assert!(screenshot.children.is_empty());

    let digest = screenshot.content_digest().unwrap();
    assert_eq!(digest.len(), DIGEST_HEX_LEN);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

    // The service rendered the site URL; the image URL went to the materializer
    assert_eq!(harness.service.calls(), vec!["https://example.com".to_string()]);
    assert_eq!(harness.materializer.calls(), vec!["https://cdn/img.png".to_string()]);
    assert_eq!(
        screenshot.screenshot_file,
        harness.ids.create_node_id("https://cdn/img.png")
    );

    // Exactly one screenshot registered, linked as a child of the site
    let screenshots = harness.store.nodes_of_type(SCREENSHOT_TYPE);
    assert_eq!(screenshots.len(), 1);
    assert_eq!(ScreenshotNode::try_from(&screenshots[0]).unwrap(), screenshot);

    let site = harness.store.get_node(&NodeId::from("site-1")).unwrap().unwrap();
    assert_eq!(site.children, vec![screenshot.id.clone()]);

    let file = harness
        .store
        .get_node(&screenshot.screenshot_file)
        .unwrap()
        .unwrap();
    assert!(file.is_type(FILE_TYPE));
    assert_eq!(
        screenshots[0].field_str(SCREENSHOT_FILE_FIELD),
        Some(file.id.as_str())
    );
}

#[tokio::test]
async fn test_recapture_reuses_screenshot_id() {
    let harness = Harness::new(FakeScreenshotService::new(FAR_FUTURE), "SitesYaml");
    let site = harness.add(Node::new("site-1", "SitesYaml").with_field("url", "https://example.com"));

    let first = harness
        .plugin
        .on_create_node(&site, harness.host())
        .await
        .unwrap()
        .unwrap();
    let second = harness
        .plugin
        .on_create_node(&site, harness.host())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.id.as_str(), "site-1 >>> Screenshot");
    // Fake service hands out a new image URL per call, so the file and digest change
    assert_ne!(first.screenshot_file, second.screenshot_file);
    assert_ne!(first.content_digest(), second.content_digest());

    assert_eq!(harness.store.nodes_of_type(SCREENSHOT_TYPE).len(), 1);
    let site = harness.store.get_node(&NodeId::from("site-1")).unwrap().unwrap();
    assert_eq!(site.children, vec![first.id]);
}

#[tokio::test]
async fn test_non_matching_nodes_have_no_side_effects() {
    let harness = Harness::new(FakeScreenshotService::new(FAR_FUTURE), "SitesYaml");
    let nodes = vec![
        harness.add(Node::new("md", "MarkdownRemark").with_field("url", "https://example.com")),
        harness.add(Node::new("no-url", "SitesYaml")),
        harness.add(Node::new("empty-url", "SitesYaml").with_field("url", "")),
        harness.add(Node::new("null-url", "SitesYaml").with_field("url", serde_json::Value::Null)),
    ];
    let before = harness.store.get_nodes().unwrap();

    for node in &nodes {
        let result = harness.plugin.on_create_node(node, harness.host()).await.unwrap();
        assert!(result.is_none(), "node {} should be skipped", node.id);
    }

    assert!(harness.service.calls().is_empty());
    assert!(harness.materializer.calls().is_empty());
    assert_eq!(harness.store.get_nodes().unwrap(), before);
}

#[tokio::test]
async fn test_upstream_failure_propagates() {
    let harness = Harness::new(
        FakeScreenshotService::new(FAR_FUTURE).failing_for("https://down.example"),
        "SitesYaml",
    );
    let site = harness.add(Node::new("site-1", "SitesYaml").with_field("url", "https://down.example"));

    let result = harness.plugin.on_create_node(&site, harness.host()).await;

    assert!(matches!(
        result,
        Err(CaptureError::UpstreamStatus { status: 503, .. })
    ));
    assert!(harness.materializer.calls().is_empty());
    assert!(harness.store.nodes_of_type(SCREENSHOT_TYPE).is_empty());
    let site = harness.store.get_node(&NodeId::from("site-1")).unwrap().unwrap();
    assert!(site.children.is_empty());
}

#[tokio::test]
async fn test_capture_without_registered_parent_fails_on_link() {
    let harness = Harness::new(FakeScreenshotService::new(FAR_FUTURE), "SitesYaml");
    // Source node never registered with the store
    let site = Node::new("ghost", "SitesYaml").with_field("url", "https://example.com");

    let result = harness.plugin.on_create_node(&site, harness.host()).await;
    assert!(matches!(result, Err(CaptureError::StorageError(_))));
}
