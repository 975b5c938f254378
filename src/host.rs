//! Host capabilities consumed by the capture flow.
//!
//! The build host owns the node store, the plugin cache and node id
//! generation. The capture flow only ever reaches them through these traits,
//! passed in explicitly as a `HostContext`.

use crate::error::StorageError;
use crate::ids::IdGenerator;
use crate::node::Node;
use crate::types::NodeId;
use async_trait::async_trait;
use serde_json::Value;

/// Node store interface
pub trait NodeStore: Send + Sync {
    /// Register a node, replacing any node with the same id.
    fn create_node(&self, node: Node) -> Result<(), StorageError>;

    /// Record `child` in the children of `parent`.
    fn create_parent_child_link(&self, parent: &NodeId, child: &NodeId)
        -> Result<(), StorageError>;

    /// Mark a node as still referenced so the host does not reclaim it.
    fn touch_node(&self, node_id: &NodeId) -> Result<(), StorageError>;

    fn get_node(&self, node_id: &NodeId) -> Result<Option<Node>, StorageError>;

    fn get_nodes(&self) -> Result<Vec<Node>, StorageError>;
}

/// Plugin-scoped key/value cache that outlives a single run.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// Capability handles handed to every hook invocation.
#[derive(Clone, Copy)]
pub struct HostContext<'a> {
    pub store: &'a dyn NodeStore,
    pub cache: &'a dyn Cache,
    pub ids: &'a dyn IdGenerator,
}

impl<'a> HostContext<'a> {
    pub fn new(store: &'a dyn NodeStore, cache: &'a dyn Cache, ids: &'a dyn IdGenerator) -> Self {
        Self { store, cache, ids }
    }
}
