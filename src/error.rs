//! Error types for butterfly-edgeroute
//!
//! Library code returns these typed errors; the binary wraps them with `anyhow` context.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::{EdgeId, NodeId};

/// Failures while importing a map source into a graph store
#[derive(Debug, Error)]
pub enum IngestError {
    /// Expected node count is missing, zero or negative
    #[error("Expected nodes not in bounds: {0}")]
    ExpectedNodes(i64),

    /// Coordinate data of a node could not be used. Aborts the import.
    #[error("cannot handle lat/lon of node {id}: {lat},{lon}")]
    MalformedCoordinate { id: i64, lat: String, lon: String },

    /// The element stream could not be read at all
    #[error("couldn't process map source: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the graph store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode graph: {0}")]
    Encode(#[from] bincode::Error),

    /// Edge ids must leave the top bit free for the search direction flag
    #[error("graph has too many edges: edge id {0} exceeds 31 bits")]
    EdgeCapacity(u64),

    #[error("node {node} does not exist (graph has {node_count} nodes)")]
    UnknownNode { node: NodeId, node_count: usize },
}

/// Fatal conditions of a single search run
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// An edge id with the direction bit already set reached the relaxation step
    #[error("graph has too many edges: edge id {0:#x} collides with the direction bit")]
    EdgeIdOverflow(EdgeId),

    #[error("node {node} is outside the graph ({node_count} nodes)")]
    NodeOutOfBounds { node: NodeId, node_count: usize },
}

/// Invalid or incomplete configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Graph not found and no OSM file provided")]
    MissingSource,

    #[error("OSM file does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}
