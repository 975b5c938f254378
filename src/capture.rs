//! Screenshot capture flow.
//!
//! capture(url, parent):
//! 1. ask the screenshot service to render `url`
//! 2. materialize the rendered image as a File node
//! 3. build the Screenshot node (id derived from `parent`), digest it
//! 4. register it with the host store

use crate::clock::{Clock, SystemClock};
use crate::config::PluginOptions;
use crate::error::CaptureError;
use crate::host::HostContext;
use crate::ids::screenshot_node_id;
use crate::materialize::{FileMaterializer, RemoteFileMaterializer};
use crate::node::ScreenshotNode;
use crate::provider::{build_http_client, HttpScreenshotService, ScreenshotService};
use crate::types::NodeId;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Name recorded as the owner of every node this crate creates.
pub const PLUGIN_NAME: &str = "screenshot-transformer";

/// The screenshot hook set with its collaborators.
pub struct ScreenshotPlugin {
    pub(crate) options: PluginOptions,
    pub(crate) service: Arc<dyn ScreenshotService>,
    pub(crate) materializer: Arc<dyn FileMaterializer>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ScreenshotPlugin {
    pub fn new(
        options: PluginOptions,
        service: Arc<dyn ScreenshotService>,
        materializer: Arc<dyn FileMaterializer>,
    ) -> Self {
        Self {
            options,
            service,
            materializer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Wire the HTTP service and remote file downloads from options.
    ///
    /// Downloaded images land in `files_dir`.
    pub fn from_options(options: PluginOptions, files_dir: &Path) -> Result<Self, CaptureError> {
        let timeout = options.request_timeout_secs.map(Duration::from_secs);
        let service = HttpScreenshotService::new(options.endpoint.clone(), timeout)?;
        let materializer =
            RemoteFileMaterializer::new(build_http_client(timeout)?, files_dir).with_owner(PLUGIN_NAME);
        Ok(Self::new(options, Arc::new(service), Arc::new(materializer)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Capture `url` for the node `parent` and register the screenshot node.
    ///
    /// Any service, download or store failure is returned unchanged.
    pub async fn capture(
        &self,
        url: &str,
        parent: &NodeId,
        host: HostContext<'_>,
    ) -> Result<ScreenshotNode, CaptureError> {
        info!(%parent, url, "Capturing screenshot");

        let rendered = self.service.capture(url).await?;
        let file = self.materializer.materialize(&rendered.url, host).await?;

        let screenshot = ScreenshotNode::new(
            screenshot_node_id(parent),
            url.to_string(),
            rendered.expires,
            parent.clone(),
            file.id,
            Some(PLUGIN_NAME.to_string()),
        )?;

        host.store.create_node(screenshot.to_node()?)?;

        info!(
            node_id = %screenshot.id,
            expires = %screenshot.expires,
            "Screenshot node created"
        );
        Ok(screenshot)
    }
}
