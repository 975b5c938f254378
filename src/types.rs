//! Core identifiers and node type names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node type of the derived screenshot records.
pub const SCREENSHOT_TYPE: &str = "Screenshot";

/// Node type of downloaded image files.
pub const FILE_TYPE: &str = "File";

/// Default node type that carries a `url` to capture.
pub const DEFAULT_SOURCE_TYPE: &str = "SitesYaml";

/// Identifier of a node in the host store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
