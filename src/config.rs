//! Configuration System
//!
//! Layered configuration for the screenshot hooks: built-in defaults, then the
//! global config file, then workspace config files, then `SCREENSHOT__*`
//! environment variables.

use crate::error::CaptureError;
use crate::logging::LoggingConfig;
use crate::provider::DEFAULT_SCREENSHOT_ENDPOINT;
use crate::types::DEFAULT_SOURCE_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default)]
    pub plugin: PluginOptions,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options of the screenshot hooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Rendering service endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Node type whose `url` gets captured
    #[serde(default = "default_source_kind")]
    pub source_kind: String,

    /// Per-request timeout; unset means requests may wait indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_SCREENSHOT_ENDPOINT.to_string()
}

fn default_source_kind() -> String {
    DEFAULT_SOURCE_TYPE.to_string()
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            source_kind: default_source_kind(),
            request_timeout_secs: None,
        }
    }
}

/// Storage paths, relative to the workspace unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_files_path")]
    pub files_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".screenshot/store")
}

fn default_files_path() -> PathBuf {
    PathBuf::from(".screenshot/files")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            files_path: default_files_path(),
        }
    }
}

impl StorageConfig {
    pub fn store_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.store_path)
    }

    pub fn files_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.files_path)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Plugin(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Plugin(msg) => write!(f, "Plugin: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PluginOptions {
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid endpoint '{}': {}", self.endpoint, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("Endpoint must be http(s): {}", self.endpoint));
        }
        if self.source_kind.trim().is_empty() {
            return Err("Source kind cannot be empty".to_string());
        }
        if self.request_timeout_secs == Some(0) {
            return Err("Request timeout must be positive".to_string());
        }
        Ok(())
    }
}

impl ScreenshotConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.plugin.validate() {
            errors.push(ValidationError::Plugin(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("Store path cannot be empty".to_string()));
        }
        if self.storage.files_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("Files path cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads `ScreenshotConfig` from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<ScreenshotConfig, CaptureError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        let config: ScreenshotConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Load configuration from a single file, skipping the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<ScreenshotConfig, CaptureError> {
        let builder = merge::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        let builder = sources::environment::add_to_builder(builder);
        let config: ScreenshotConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    fn validated(config: ScreenshotConfig) -> Result<ScreenshotConfig, CaptureError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            CaptureError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
