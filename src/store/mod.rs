//! Node store and cache implementations.
//!
//! `MemoryNodeStore` and `MemoryCache` back tests and embedded hosts;
//! `SledNodeStore` and `SledCache` persist across runs for the CLI harness.

pub mod persistence;

pub use persistence::{SledCache, SledNodeStore};

use crate::error::StorageError;
use crate::host::{Cache, NodeStore};
use crate::node::Node;
use crate::types::NodeId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory node store.
///
/// Nodes are kept in id order so `get_nodes` is deterministic.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<BTreeMap<NodeId, Node>>,
    touched: RwLock<BTreeSet<NodeId>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store already holding `nodes`.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let store = Self::new();
        {
            let mut map = store.nodes.write();
            for node in nodes {
                map.insert(node.id.clone(), node);
            }
        }
        store
    }

    /// Ids touched since the store was created.
    pub fn touched(&self) -> BTreeSet<NodeId> {
        self.touched.read().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn nodes_of_type(&self, node_type: &str) -> Vec<Node> {
        self.nodes
            .read()
            .values()
            .filter(|n| n.is_type(node_type))
            .cloned()
            .collect()
    }
}

impl NodeStore for MemoryNodeStore {
    fn create_node(&self, node: Node) -> Result<(), StorageError> {
        self.nodes.write().insert(node.id.clone(), node);
        Ok(())
    }

    fn create_parent_child_link(
        &self,
        parent: &NodeId,
        child: &NodeId,
    ) -> Result<(), StorageError> {
        let mut nodes = self.nodes.write();
        let parent_node = nodes
            .get_mut(parent)
            .ok_or_else(|| StorageError::NodeNotFound(parent.clone()))?;
        if !parent_node.children.contains(child) {
            parent_node.children.push(child.clone());
        }
        Ok(())
    }

    fn touch_node(&self, node_id: &NodeId) -> Result<(), StorageError> {
        self.touched.write().insert(node_id.clone());
        Ok(())
    }

    fn get_node(&self, node_id: &NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.read().get(node_id).cloned())
    }

    fn get_nodes(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.nodes.read().values().cloned().collect())
    }
}

/// In-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}
