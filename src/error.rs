//! Error types for screenshot capture and the host stores.

use crate::types::NodeId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Failed to encode node {0}: {1}")]
    Encode(NodeId, String),

    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Errors surfaced by the capture flow and the lifecycle hooks.
///
/// Nothing in this crate retries or swallows these; they propagate to the
/// hook caller as a failed build step.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screenshot service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Screenshot service returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Malformed screenshot response: {0}")]
    MalformedResponse(String),

    #[error("File materialization failed for {url}: {reason}")]
    Materialize { url: String, reason: String },

    #[error("Node {node_id} is missing `{field}`")]
    IncompleteNode { node_id: NodeId, field: &'static str },

    #[error("Failed to serialize node for digest: {0}")]
    Digest(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for CaptureError {
    fn from(err: config::ConfigError) -> Self {
        CaptureError::ConfigError(err.to_string())
    }
}
