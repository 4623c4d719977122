use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{EdgeCursor, EdgeFlags, EdgeId, Graph, NodeId, MAX_EDGE_ID};
use crate::error::StorageError;
use crate::geo::BBox;

/// Upper bound on the up-front reservation of [`GraphStorage::with_capacity`]
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct NodeEntry {
    lat: f64,
    lon: f64,
    ele: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct EdgeEntry {
    base: NodeId,
    adj: NodeId,
    distance: f64,
    flags: EdgeFlags,
}

/// In-memory graph store.
///
/// Mutable while the importer owns it; once handed to the search it is only read,
/// so any number of searches may share a `&GraphStorage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStorage {
    nodes: Vec<NodeEntry>,
    edges: Vec<EdgeEntry>,
    /// Edge ids per node, in insertion order
    adjacency: Vec<Vec<EdgeId>>,
    bounds: BBox,
    #[serde(skip)]
    removed: FxHashSet<NodeId>,
}

impl GraphStorage {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty store with room for `nodes` nodes, capped at [`MAX_INITIAL_CAPACITY`].
    /// The store still grows past the cap on demand.
    pub fn with_capacity(nodes: usize) -> Self {
        let nodes = nodes.min(MAX_INITIAL_CAPACITY);
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(nodes),
            adjacency: Vec::with_capacity(nodes),
            bounds: BBox::empty(),
            removed: FxHashSet::default(),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn elevation(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(node as usize).and_then(|n| n.ele)
    }

    /// Number of edges touching `node`
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node as usize).map_or(0, Vec::len)
    }

    pub fn add_node(&mut self, lat: f64, lon: f64, ele: Option<f64>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeEntry { lat, lon, ele });
        self.adjacency.push(Vec::new());
        self.bounds.extend(lat, lon);
        id
    }

    /// Append an edge between two existing nodes, oriented `base -> adj`
    pub fn add_edge(
        &mut self,
        base: NodeId,
        adj: NodeId,
        distance: f64,
        flags: EdgeFlags,
    ) -> Result<EdgeId, StorageError> {
        for node in [base, adj] {
            if node as usize >= self.nodes.len() {
                return Err(StorageError::UnknownNode {
                    node,
                    node_count: self.nodes.len(),
                });
            }
        }

        let next = self.edges.len() as u64;
        if next > MAX_EDGE_ID as u64 {
            return Err(StorageError::EdgeCapacity(next));
        }

        let edge = next as EdgeId;
        self.edges.push(EdgeEntry {
            base,
            adj,
            distance,
            flags,
        });
        self.adjacency[base as usize].push(edge);
        if adj != base {
            self.adjacency[adj as usize].push(edge);
        }
        Ok(edge)
    }

    /// Flag a node for removal by the next [`optimize`](Self::optimize)
    pub fn mark_removed(&mut self, node: NodeId) {
        if (node as usize) < self.nodes.len() {
            self.removed.insert(node);
        }
    }

    pub fn is_removed(&self, node: NodeId) -> bool {
        self.removed.contains(&node)
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Drop removed nodes and their edges, renumbering what is left densely.
    /// Relative order of the surviving nodes and edges is kept. Returns removed node count.
    pub fn optimize(&mut self) -> usize {
        if self.removed.is_empty() {
            return 0;
        }

        let removed = self.removed.len();
        let kept: Vec<NodeId> = (0..self.nodes.len() as NodeId)
            .filter(|n| !self.removed.contains(n))
            .collect();

        *self = self.rebuild(&kept);
        removed
    }

    /// New store with nodes renumbered in depth-first order for better memory locality.
    /// Removed nodes are dropped as in [`optimize`](Self::optimize).
    pub fn sort_dfs(&self) -> GraphStorage {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut stack = Vec::new();

        for root in 0..n as NodeId {
            if visited[root as usize] || self.removed.contains(&root) {
                continue;
            }
            stack.push(root);
            visited[root as usize] = true;

            while let Some(node) = stack.pop() {
                order.push(node);
                for cursor in self.edges(node) {
                    let next = cursor.adj as usize;
                    if !visited[next] && !self.removed.contains(&cursor.adj) {
                        visited[next] = true;
                        stack.push(cursor.adj);
                    }
                }
            }
        }

        self.rebuild(&order)
    }

    /// Copy `order` (old ids, in their new sequence) into a fresh store.
    /// Edges whose endpoints both survive keep their relative order.
    fn rebuild(&self, order: &[NodeId]) -> GraphStorage {
        let mut mapping: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut out = GraphStorage::with_capacity(order.len());

        for &old in order {
            let entry = self.nodes[old as usize];
            mapping[old as usize] = Some(out.add_node(entry.lat, entry.lon, entry.ele));
        }

        for entry in &self.edges {
            if let (Some(base), Some(adj)) = (mapping[entry.base as usize], mapping[entry.adj as usize]) {
                let edge = out.edges.len() as EdgeId;
                out.edges.push(EdgeEntry { base, adj, ..*entry });
                out.adjacency[base as usize].push(edge);
                if adj != base {
                    out.adjacency[adj as usize].push(edge);
                }
            }
        }

        out
    }

    fn cursor(&self, edge: EdgeId, from: NodeId) -> EdgeCursor {
        let entry = &self.edges[edge as usize];
        if entry.base == from {
            EdgeCursor {
                edge,
                base: entry.base,
                adj: entry.adj,
                distance: entry.distance,
                flags: entry.flags,
            }
        } else {
            EdgeCursor {
                edge,
                base: entry.adj,
                adj: entry.base,
                distance: entry.distance,
                flags: entry.flags.reversed(),
            }
        }
    }
}

impl Graph for GraphStorage {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edges(&self, node: NodeId) -> impl Iterator<Item = EdgeCursor> + '_ {
        self.adjacency
            .get(node as usize)
            .into_iter()
            .flatten()
            .map(move |&edge| self.cursor(edge, node))
    }

    fn edge_state(&self, edge: EdgeId, adj: NodeId) -> Option<EdgeCursor> {
        let entry = self.edges.get(edge as usize)?;
        if entry.adj == adj {
            Some(self.cursor(edge, entry.base))
        } else if entry.base == adj {
            Some(self.cursor(edge, entry.adj))
        } else {
            None
        }
    }

    fn coordinate(&self, node: NodeId) -> Option<(f64, f64)> {
        self.nodes.get(node as usize).map(|n| (n.lat, n.lon))
    }

    fn bounds(&self) -> BBox {
        self.bounds
    }
}

impl std::fmt::Display for GraphStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes: {}, edges: {}, bounds: {}",
            self.nodes.len(),
            self.edges.len(),
            self.bounds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> EdgeFlags {
        EdgeFlags::new(true, true, 50)
    }

    fn line(n: usize) -> GraphStorage {
        let mut g = GraphStorage::new();
        for i in 0..n {
            g.add_node(0.0, i as f64 * 0.001, None);
        }
        for i in 1..n as NodeId {
            g.add_edge(i - 1, i, 100.0, both()).unwrap();
        }
        g
    }

    #[test]
    fn test_oversized_capacity_is_capped() {
        let mut g = GraphStorage::with_capacity(usize::MAX);
        assert!(g.nodes.capacity() <= MAX_INITIAL_CAPACITY);
        assert!(g.edges.capacity() <= MAX_INITIAL_CAPACITY);
        assert!(g.adjacency.capacity() <= MAX_INITIAL_CAPACITY);

        let a = g.add_node(0.0, 0.0, None);
        let b = g.add_node(0.0, 0.001, None);
        g.add_edge(a, b, 111.0, both()).unwrap();
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_cursor_presents_from_both_sides() {
        let mut g = GraphStorage::new();
        let a = g.add_node(0.0, 0.0, None);
        let b = g.add_node(0.0, 0.001, Some(12.5));
        let e = g.add_edge(a, b, 111.0, EdgeFlags::new(true, false, 30)).unwrap();

        let from_a: Vec<_> = g.edges(a).collect();
        assert_eq!(from_a.len(), 1);
        assert_eq!((from_a[0].base, from_a[0].adj), (a, b));
        assert!(from_a[0].flags.forward());

        let from_b: Vec<_> = g.edges(b).collect();
        assert_eq!((from_b[0].base, from_b[0].adj), (b, a));
        assert!(!from_b[0].flags.forward());
        assert!(from_b[0].flags.backward());

        assert_eq!(g.edge_state(e, b).unwrap().base, a);
        assert_eq!(g.edge_state(e, a).unwrap().base, b);
        assert!(g.edge_state(e, 7).is_none());
        assert_eq!(g.elevation(b), Some(12.5));
    }

    #[test]
    fn test_add_edge_rejects_unknown_node() {
        let mut g = GraphStorage::new();
        g.add_node(0.0, 0.0, None);
        let err = g.add_edge(0, 3, 1.0, both()).unwrap_err();
        assert!(matches!(err, StorageError::UnknownNode { node: 3, .. }));
    }

    #[test]
    fn test_optimize_compacts_and_renumbers() {
        let mut g = line(5);
        g.mark_removed(0);
        g.mark_removed(4);

        assert_eq!(g.optimize(), 2);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.removed_count(), 0);
        assert_eq!(g.coordinate(0), Some((0.0, 0.001)));

        let adj: Vec<_> = g.edges(1).map(|c| c.adj).collect();
        assert_eq!(adj, vec![0, 2]);
        assert_eq!(g.optimize(), 0);
    }

    #[test]
    fn test_sort_dfs_keeps_topology() {
        let mut g = GraphStorage::new();
        for i in 0..4 {
            g.add_node(i as f64, 0.0, None);
        }
        // 0-3, 3-1, 1-2
        g.add_edge(0, 3, 1.0, both()).unwrap();
        g.add_edge(3, 1, 2.0, both()).unwrap();
        g.add_edge(1, 2, 3.0, both()).unwrap();

        let sorted = g.sort_dfs();
        assert_eq!(sorted.node_count(), 4);
        assert_eq!(sorted.edge_count(), 3);
        // DFS from 0 reaches old node 3 second
        assert_eq!(sorted.coordinate(1), Some((3.0, 0.0)));

        let total: f64 = (0..4).flat_map(|n| sorted.edges(n)).map(|c| c.distance).sum();
        assert_eq!(total, 12.0);
    }

    #[test]
    fn test_bounds_follow_nodes() {
        let g = line(3);
        let bounds = g.bounds();
        assert_eq!(bounds.min_lon, 0.0);
        assert!((bounds.max_lon - 0.002).abs() < 1e-12);
    }
}
