//! Node id derivation.

use crate::types::{NodeId, SCREENSHOT_TYPE};

/// Separator between a parent id and the screenshot suffix.
const CHILD_SEPARATOR: &str = " >>> ";

/// Id of the screenshot node captured for `parent`.
///
/// A pure function of the parent id: capturing the same parent again yields
/// the same id, so the refreshed node replaces the previous one.
pub fn screenshot_node_id(parent: &NodeId) -> NodeId {
    NodeId::new(format!("{}{}{}", parent, CHILD_SEPARATOR, SCREENSHOT_TYPE))
}

/// Generates host node ids from a seed string.
pub trait IdGenerator: Send + Sync {
    fn create_node_id(&self, seed: &str) -> NodeId;
}

/// Deterministic generator: hex(blake3(namespace || 0x00 || seed)).
///
/// Ids are scoped to the namespace so two plugins hashing the same seed do
/// not collide.
#[derive(Debug, Clone)]
pub struct NamespacedIdGenerator {
    namespace: String,
}

impl NamespacedIdGenerator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl IdGenerator for NamespacedIdGenerator {
    fn create_node_id(&self, seed: &str) -> NodeId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.namespace.as_bytes());
        hasher.update(&[0]);
        hasher.update(seed.as_bytes());
        NodeId::new(hasher.finalize().to_hex().to_string())
    }
}
