//! Persistence layer for the node store and cache

use crate::error::StorageError;
use crate::host::{Cache, NodeStore};
use crate::node::Node;
use crate::types::NodeId;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

const NODES_TREE: &str = "nodes";
const TOUCHED_TREE: &str = "touched";
const CACHE_TREE: &str = "cache";

/// Sled-based implementation of NodeStore
///
/// Nodes are stored as JSON keyed by node id. Flattened node fields need a
/// self-describing encoding, so JSON is used rather than a binary codec.
pub struct SledNodeStore {
    db: sled::Db,
    nodes: sled::Tree,
    touched: sled::Tree,
}

impl SledNodeStore {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let nodes = db.open_tree(NODES_TREE)?;
        let touched = db.open_tree(TOUCHED_TREE)?;
        Ok(Self { db, nodes, touched })
    }

    /// Cache sharing this store's database
    pub fn cache(&self) -> Result<SledCache, StorageError> {
        SledCache::from_db(&self.db)
    }

    /// Ids touched since the store was opened
    pub fn touched(&self) -> Result<Vec<NodeId>, StorageError> {
        self.touched
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                let id = String::from_utf8(key.to_vec())
                    .map_err(|e| StorageError::Decode(e.to_string()))?;
                Ok(NodeId::new(id))
            })
            .collect()
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<Node, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Decode(e.to_string()))
    }
}

impl NodeStore for SledNodeStore {
    fn create_node(&self, node: Node) -> Result<(), StorageError> {
        let value =
            serde_json::to_vec(&node).map_err(|e| StorageError::Encode(node.id.clone(), e.to_string()))?;
        self.nodes.insert(node.id.as_str().as_bytes(), value)?;
        Ok(())
    }

    fn create_parent_child_link(
        &self,
        parent: &NodeId,
        child: &NodeId,
    ) -> Result<(), StorageError> {
        let mut node = self
            .get_node(parent)?
            .ok_or_else(|| StorageError::NodeNotFound(parent.clone()))?;
        if !node.children.contains(child) {
            node.children.push(child.clone());
            self.create_node(node)?;
        }
        Ok(())
    }

    fn touch_node(&self, node_id: &NodeId) -> Result<(), StorageError> {
        let stamp = chrono::Utc::now().to_rfc3339();
        self.touched
            .insert(node_id.as_str().as_bytes(), stamp.as_bytes())?;
        Ok(())
    }

    fn get_node(&self, node_id: &NodeId) -> Result<Option<Node>, StorageError> {
        match self.nodes.get(node_id.as_str().as_bytes())? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn get_nodes(&self) -> Result<Vec<Node>, StorageError> {
        self.nodes
            .iter()
            .values()
            .map(|value| Self::decode(&value?))
            .collect()
    }
}

/// Sled-backed cache
pub struct SledCache {
    tree: sled::Tree,
}

impl SledCache {
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(CACHE_TREE)?,
        })
    }
}

#[async_trait]
impl Cache for SledCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.tree.get(key.as_bytes())? {
            Some(value) => serde_json::from_slice(&value)
                .map(Some)
                .map_err(|e| StorageError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&value).map_err(|e| StorageError::Decode(e.to_string()))?;
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}
