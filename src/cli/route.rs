//! CLI route: single route table and run context.

use crate::capture::{ScreenshotPlugin, PLUGIN_NAME};
use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, ScreenshotConfig};
use crate::error::CaptureError;
use crate::host::{HostContext, NodeStore};
use crate::ids::{IdGenerator, NamespacedIdGenerator};
use crate::node::{Node, ScreenshotNode};
use crate::store::{SledCache, SledNodeStore};
use crate::types::{NodeId, SCREENSHOT_TYPE};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: workspace, config, store and plugin.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ScreenshotConfig,
    store: SledNodeStore,
    cache: SledCache,
    ids: NamespacedIdGenerator,
    plugin: ScreenshotPlugin,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CaptureError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    pub fn with_config(workspace_root: PathBuf, config: ScreenshotConfig) -> Result<Self, CaptureError> {
        let store_dir = config.storage.store_dir(&workspace_root);
        std::fs::create_dir_all(&store_dir)?;
        let store = SledNodeStore::new(&store_dir)?;
        let cache = store.cache()?;

        let plugin = ScreenshotPlugin::from_options(
            config.plugin.clone(),
            &config.storage.files_dir(&workspace_root),
        )?;

        Ok(Self {
            workspace_root,
            config,
            store,
            cache,
            ids: NamespacedIdGenerator::new(PLUGIN_NAME),
            plugin,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn store(&self) -> &SledNodeStore {
        &self.store
    }

    fn host(&self) -> HostContext<'_> {
        HostContext::new(&self.store, &self.cache, &self.ids)
    }

    /// Execute a command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, CaptureError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let output = match command {
            Commands::Add { url, id } => runtime.block_on(self.handle_add(url, id.as_deref()))?,
            Commands::Bootstrap => runtime.block_on(self.handle_bootstrap())?,
            Commands::List { format } => self.handle_list(format)?,
        };
        self.store.flush()?;
        Ok(output)
    }

    async fn handle_add(&self, url: &str, id: Option<&str>) -> Result<String, CaptureError> {
        let site_id = match id {
            Some(id) => NodeId::from(id),
            None => self.ids.create_node_id(url),
        };
        let site = Node::new(site_id, self.config.plugin.source_kind.clone()).with_field("url", url);
        self.store.create_node(site.clone())?;
        info!(node_id = %site.id, url, "Site node added");

        match self.plugin.on_create_node(&site, self.host()).await? {
            Some(screenshot) => Ok(format!(
                "Captured {} -> {} (expires {})",
                screenshot.url, screenshot.id, screenshot.expires
            )),
            None => Ok(format!("Node {} has no URL to capture", site.id)),
        }
    }

    async fn handle_bootstrap(&self) -> Result<String, CaptureError> {
        let summary = self.plugin.on_pre_bootstrap(self.host()).await?;
        Ok(format!(
            "Refreshed {} screenshot(s), kept {} file(s)",
            summary.refreshed.len(),
            summary.touched.len()
        ))
    }

    fn handle_list(&self, format: &str) -> Result<String, CaptureError> {
        let screenshots = self
            .store
            .get_nodes()?
            .iter()
            .filter(|n| n.is_type(SCREENSHOT_TYPE))
            .map(ScreenshotNode::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        match format {
            "json" => serde_json::to_string_pretty(&screenshots)
                .map_err(|e| CaptureError::Digest(e.to_string())),
            "text" => {
                if screenshots.is_empty() {
                    return Ok("No screenshots".to_string());
                }
                Ok(screenshots
                    .iter()
                    .map(|s| format!("{}\t{}\t{}", s.id, s.url, s.expires))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            other => Err(CaptureError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}
