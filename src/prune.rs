//! Subnetwork removal
//!
//! Runs once, after the builder and before compaction. Pruners only mark nodes;
//! [`GraphStorage::optimize`] drops them.

use std::collections::VecDeque;

use crate::storage::{Graph, GraphStorage, NodeId};

/// Outcome of a prune run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Connected components before pruning
    pub subnetworks: usize,
    pub removed_nodes: usize,
    /// Connected components left afterwards
    pub remaining_subnetworks: usize,
}

pub trait SubnetworkPruner {
    fn prune(&self, graph: &mut GraphStorage) -> PruneReport;
}

/// Keeps only the largest connected component, edges taken as undirected.
/// On a tie the component holding the lowest node id wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestComponentPruner;

impl SubnetworkPruner for LargestComponentPruner {
    fn prune(&self, graph: &mut GraphStorage) -> PruneReport {
        let components = connected_components(graph);
        let subnetworks = components.len();

        let mut largest = 0;
        for (i, component) in components.iter().enumerate() {
            if component.len() > components[largest].len() {
                largest = i;
            }
        }

        let mut removed_nodes = 0;
        for (i, component) in components.iter().enumerate() {
            if i == largest {
                continue;
            }
            for &node in component {
                graph.mark_removed(node);
            }
            removed_nodes += component.len();
        }

        PruneReport {
            subnetworks,
            removed_nodes,
            remaining_subnetworks: connected_components(graph).len(),
        }
    }
}

/// Components of the nodes not yet marked removed, in order of their lowest node id
pub fn connected_components(graph: &GraphStorage) -> Vec<Vec<NodeId>> {
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for root in 0..n as NodeId {
        if seen[root as usize] || graph.is_removed(root) {
            continue;
        }
        seen[root as usize] = true;
        queue.push_back(root);

        let mut component = Vec::new();
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for cursor in graph.edges(node) {
                let next = cursor.adj;
                if !seen[next as usize] && !graph.is_removed(next) {
                    seen[next as usize] = true;
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}
