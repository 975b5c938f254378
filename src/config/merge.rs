//! Merge rules: defaults, override order.

use crate::provider::DEFAULT_SCREENSHOT_ENDPOINT;
use crate::types::DEFAULT_SOURCE_TYPE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("plugin.endpoint", DEFAULT_SCREENSHOT_ENDPOINT)?
        .set_default("plugin.source_kind", DEFAULT_SOURCE_TYPE)?
        .set_default("storage.store_path", ".screenshot/store")?
        .set_default("storage.files_path", ".screenshot/files")
}
