//! Build lifecycle hooks.
//!
//! `on_create_node` reacts to each new source node; `on_pre_bootstrap` runs
//! once at startup over the screenshot nodes left from earlier runs.

use crate::capture::ScreenshotPlugin;
use crate::clock::parse_timestamp;
use crate::error::CaptureError;
use crate::host::HostContext;
use crate::node::{Node, ScreenshotNode, SCREENSHOT_FILE_FIELD};
use crate::types::{NodeId, SCREENSHOT_TYPE};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{debug, info, warn};

/// What startup reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Screenshot nodes re-captured because they had expired
    pub refreshed: Vec<NodeId>,
    /// File nodes marked as still in use
    pub touched: Vec<NodeId>,
    /// Live screenshot nodes without a file reference
    pub unreferenced: Vec<NodeId>,
}

enum Reconciled {
    Refreshed(NodeId),
    Touched(NodeId),
    Unreferenced(NodeId),
}

/// True when the node's `expires` lies strictly before `now`.
///
/// A missing or unreadable `expires` never counts as expired.
pub fn is_expired(node: &Node, now: DateTime<Utc>) -> bool {
    node.field_str("expires")
        .and_then(parse_timestamp)
        .map_or(false, |expires| expires < now)
}

impl ScreenshotPlugin {
    /// Node-creation hook.
    ///
    /// Source nodes with a non-empty `url` get a screenshot node linked as
    /// their child. Every other node is ignored and `Ok(None)` returned.
    pub async fn on_create_node(
        &self,
        node: &Node,
        host: HostContext<'_>,
    ) -> Result<Option<ScreenshotNode>, CaptureError> {
        let Some(url) = node.capture_url(&self.options.source_kind) else {
            debug!(node_id = %node.id, node_type = node.node_type(), "Skipping node");
            return Ok(None);
        };

        let screenshot = self.capture(url, &node.id, host).await?;
        host.store.create_parent_child_link(&node.id, &screenshot.id)?;
        Ok(Some(screenshot))
    }

    /// Startup hook.
    ///
    /// Expired screenshot nodes are captured again; the rest have their file
    /// node touched so the host keeps it. All nodes are handled concurrently
    /// and the first failure fails the whole step.
    pub async fn on_pre_bootstrap(
        &self,
        host: HostContext<'_>,
    ) -> Result<ReconcileSummary, CaptureError> {
        let now = self.clock.now();
        let screenshots: Vec<Node> = host
            .store
            .get_nodes()?
            .into_iter()
            .filter(|n| n.is_type(SCREENSHOT_TYPE))
            .collect();

        info!(count = screenshots.len(), "Reconciling screenshot nodes");

        let outcomes = try_join_all(
            screenshots
                .iter()
                .map(|node| self.reconcile(node, now, host)),
        )
        .await?;

        let mut summary = ReconcileSummary::default();
        for outcome in outcomes {
            match outcome {
                Reconciled::Refreshed(id) => summary.refreshed.push(id),
                Reconciled::Touched(id) => summary.touched.push(id),
                Reconciled::Unreferenced(id) => summary.unreferenced.push(id),
            }
        }

        info!(
            refreshed = summary.refreshed.len(),
            touched = summary.touched.len(),
            "Screenshot reconciliation finished"
        );
        Ok(summary)
    }

    async fn reconcile(
        &self,
        node: &Node,
        now: DateTime<Utc>,
        host: HostContext<'_>,
    ) -> Result<Reconciled, CaptureError> {
        if is_expired(node, now) {
            let url = node.field_str("url").ok_or_else(|| CaptureError::IncompleteNode {
                node_id: node.id.clone(),
                field: "url",
            })?;
            let parent = node.parent.as_ref().ok_or_else(|| CaptureError::IncompleteNode {
                node_id: node.id.clone(),
                field: "parent",
            })?;

            debug!(node_id = %node.id, "Screenshot expired");
            let refreshed = self.capture(url, parent, host).await.map_err(|e| {
                warn!(node_id = %node.id, error = %e, "Screenshot refresh failed");
                e
            })?;
            return Ok(Reconciled::Refreshed(refreshed.id));
        }

        match node.field_str(SCREENSHOT_FILE_FIELD) {
            Some(file_id) => {
                let file_id = NodeId::from(file_id);
                host.store.touch_node(&file_id)?;
                Ok(Reconciled::Touched(file_id))
            }
            None => {
                warn!(node_id = %node.id, "Screenshot node has no file reference");
                Ok(Reconciled::Unreferenced(node.id.clone()))
            }
        }
    }
}
