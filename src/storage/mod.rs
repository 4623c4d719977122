//! Graph store: array-based nodes and edges built by the importer and read by the search
//!
//! Edges are stored once per segment. Readers see them through an [`EdgeCursor`], which
//! presents the edge from whichever endpoint it was reached at.

mod file;
mod flags;
mod memory;

pub use file::{GraphFile, FORMAT_VERSION};
pub use flags::EdgeFlags;
pub use memory::{GraphStorage, MAX_INITIAL_CAPACITY};

use crate::geo::BBox;

/// Dense internal node id
pub type NodeId = u32;

/// Dense internal edge id. Must fit in 31 bits, see [`MAX_EDGE_ID`].
pub type EdgeId = u32;

/// Largest edge id the store hands out. The top bit is reserved for the search direction flag.
pub const MAX_EDGE_ID: EdgeId = 0x7FFF_FFFF;

/// One edge as seen from `base`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCursor {
    pub edge: EdgeId,
    pub base: NodeId,
    pub adj: NodeId,
    /// Length in meters
    pub distance: f64,
    /// Flags oriented base -> adj
    pub flags: EdgeFlags,
}

/// Read access to a finished graph
pub trait Graph {
    fn node_count(&self) -> usize;

    /// All edges touching `node`, each presented with `base == node`
    fn edges(&self, node: NodeId) -> impl Iterator<Item = EdgeCursor> + '_;

    /// The edge `edge` presented so that it ends at `adj`
    fn edge_state(&self, edge: EdgeId, adj: NodeId) -> Option<EdgeCursor>;

    /// (lat, lon) of a node
    fn coordinate(&self, node: NodeId) -> Option<(f64, f64)>;

    fn bounds(&self) -> BBox;
}
