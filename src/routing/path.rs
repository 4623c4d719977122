//! Route extracted from a finished search

use serde::Serialize;

use super::edge_dijkstra::{EntryId, FrontierEntry};
use crate::storage::{EdgeId, Graph, NodeId};

/// Edges and nodes from start to target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub edges: Vec<EdgeId>,
    /// Start node first, one more than `edges` unless empty
    pub nodes: Vec<NodeId>,
    /// Meters
    pub distance: f64,
    /// Total weight, turn costs included
    pub weight: f64,
}

impl Path {
    /// Walk parent links from `goal` back to the root entry
    pub(crate) fn extract<G: Graph + ?Sized>(
        graph: &G,
        entries: &[FrontierEntry],
        goal: EntryId,
    ) -> Self {
        let mut edges = Vec::new();
        let mut nodes = Vec::new();
        let mut distance = 0.0;

        let mut current = Some(goal);
        while let Some(id) = current {
            let entry = &entries[id];
            nodes.push(entry.end_node);
            if let Some(edge) = entry.edge {
                edges.push(edge);
                if let Some(state) = graph.edge_state(edge, entry.end_node) {
                    distance += state.distance;
                }
            }
            current = entry.parent;
        }

        edges.reverse();
        nodes.reverse();

        Self {
            edges,
            nodes,
            distance,
            weight: entries[goal].weight,
        }
    }

    /// Start equals target
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// (lat, lon) of every node on the path
    pub fn points<G: Graph + ?Sized>(&self, graph: &G) -> Vec<(f64, f64)> {
        self.nodes
            .iter()
            .filter_map(|&node| graph.coordinate(node))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EdgeFlags, GraphStorage};

    #[test]
    fn test_extract_follows_parents() {
        let mut g = GraphStorage::new();
        for i in 0..3 {
            g.add_node(0.0, i as f64, None);
        }
        let flags = EdgeFlags::new(true, true, 50);
        let e0 = g.add_edge(0, 1, 7.0, flags).unwrap();
        let e1 = g.add_edge(2, 1, 3.0, flags).unwrap();

        let entries = vec![
            FrontierEntry {
                edge: None,
                end_node: 0,
                weight: 0.0,
                parent: None,
            },
            FrontierEntry {
                edge: Some(e0),
                end_node: 1,
                weight: 7.0,
                parent: Some(0),
            },
            FrontierEntry {
                edge: Some(e1),
                end_node: 2,
                weight: 12.0,
                parent: Some(1),
            },
        ];

        let path = Path::extract(&g, &entries, 2);
        assert_eq!(path.edges, vec![e0, e1]);
        assert_eq!(path.nodes, vec![0, 1, 2]);
        assert_eq!(path.distance, 10.0);
        assert_eq!(path.weight, 12.0);
        assert_eq!(path.points(&g).len(), 3);

        let root = Path::extract(&g, &entries, 0);
        assert!(root.is_empty());
        assert_eq!(root.nodes, vec![0]);
        assert_eq!(root.distance, 0.0);
    }
}
