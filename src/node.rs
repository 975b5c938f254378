//! Host node records.
//!
//! `Node` is the generic shape the host store holds: an id, parent/children
//! links, an `internal` block with the node type and content digest, and any
//! number of type-specific fields flattened next to them. `ScreenshotNode` and
//! `FileNode` are the typed records this crate creates.

use crate::digest::content_digest;
use crate::error::CaptureError;
use crate::types::{NodeId, FILE_TYPE, SCREENSHOT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field on a screenshot node holding the id of its image file node.
pub const SCREENSHOT_FILE_FIELD: &str = "screenshotFile___NODE";

/// Bookkeeping every node carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,

    /// Plugin that created the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Internal {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            content_digest: None,
            owner: None,
        }
    }
}

/// A record in the host store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,

    #[serde(default)]
    pub children: Vec<NodeId>,

    pub internal: Internal,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: Vec::new(),
            internal: Internal::new(node_type),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn node_type(&self) -> &str {
        &self.internal.node_type
    }

    pub fn is_type(&self, node_type: &str) -> bool {
        self.internal.node_type == node_type
    }

    /// String value of a flattened field, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// The URL to capture when this node is a source of type `source_type`.
    ///
    /// Returns `None` for other node types and for a missing, non-string or
    /// blank `url` field.
    pub fn capture_url(&self, source_type: &str) -> Option<&str> {
        if !self.is_type(source_type) {
            return None;
        }
        self.field_str("url").filter(|url| !url.trim().is_empty())
    }
}

/// Derived record holding one site's capture metadata.
///
/// Field order is part of the content digest input and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotNode {
    pub id: NodeId,

    /// The captured site URL, not the rendered image URL
    pub url: String,

    /// Expiry timestamp exactly as the screenshot service returned it
    pub expires: String,

    pub parent: NodeId,

    pub children: Vec<NodeId>,

    pub internal: Internal,

    #[serde(rename = "screenshotFile___NODE")]
    pub screenshot_file: NodeId,
}

impl ScreenshotNode {
    /// Build a screenshot record and attach its content digest.
    pub fn new(
        id: NodeId,
        url: String,
        expires: String,
        parent: NodeId,
        screenshot_file: NodeId,
        owner: Option<String>,
    ) -> Result<Self, CaptureError> {
        let mut node = Self {
            id,
            url,
            expires,
            parent,
            children: Vec::new(),
            internal: Internal {
                node_type: SCREENSHOT_TYPE.to_string(),
                content_digest: None,
                owner,
            },
            screenshot_file,
        };
        node.internal.content_digest = Some(node.compute_digest()?);
        Ok(node)
    }

    /// Digest over every field except the digest itself.
    pub fn compute_digest(&self) -> Result<String, CaptureError> {
        let mut unsigned = self.clone();
        unsigned.internal.content_digest = None;
        content_digest(&unsigned)
    }

    pub fn content_digest(&self) -> Option<&str> {
        self.internal.content_digest.as_deref()
    }

    pub fn to_node(&self) -> Result<Node, CaptureError> {
        convert(self)
    }
}

impl TryFrom<&Node> for ScreenshotNode {
    type Error = CaptureError;

    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        convert(node)
    }
}

/// A downloaded file registered in the host store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,

    #[serde(default)]
    pub children: Vec<NodeId>,

    pub internal: Internal,

    /// Remote URL the file was fetched from
    pub url: String,

    pub absolute_path: String,

    pub extension: String,

    pub size: u64,
}

impl FileNode {
    pub fn new(
        id: NodeId,
        url: String,
        absolute_path: String,
        extension: String,
        size: u64,
        file_digest: String,
        owner: Option<String>,
    ) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            internal: Internal {
                node_type: FILE_TYPE.to_string(),
                content_digest: Some(file_digest),
                owner,
            },
            url,
            absolute_path,
            extension,
            size,
        }
    }

    pub fn to_node(&self) -> Result<Node, CaptureError> {
        convert(self)
    }
}

impl TryFrom<&Node> for FileNode {
    type Error = CaptureError;

    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        convert(node)
    }
}

fn convert<T: Serialize, U: serde::de::DeserializeOwned>(value: &T) -> Result<U, CaptureError> {
    let json = serde_json::to_value(value).map_err(|e| CaptureError::Digest(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| CaptureError::Digest(e.to_string()))
}
