//! Edge-based Dijkstra
//!
//! Labels are kept per directed edge rather than per node, so the same node can be
//! reached with different costs depending on the edge used to enter it. That is what
//! makes turn costs, which depend on the (incoming, outgoing) pair, exact.
//!
//! A search state answers exactly one query:
//!
//! ```compile_fail
//! use butterfly_edgeroute::routing::{EdgeBasedDijkstra, VehicleCostModel, Weighting};
//! use butterfly_edgeroute::storage::GraphStorage;
//!
//! let graph = GraphStorage::new();
//! let cost = VehicleCostModel::new(Weighting::Shortest);
//! let dijkstra = EdgeBasedDijkstra::new(&graph, &cost);
//! let first = dijkstra.calc_path(0, 1);
//! let second = dijkstra.calc_path(1, 0); // state was consumed by the first query
//! ```

use std::cmp::Reverse;

use log::debug;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap;

use super::path::Path;
use super::CostModel;
use crate::error::SearchError;
use crate::storage::{EdgeCursor, EdgeId, Graph, NodeId};

/// Index of a [`FrontierEntry`] in the search arena
pub type EntryId = usize;

const DIRECTION_BIT: u32 = 0x8000_0000;

/// Traversal direction of a stored edge, relative to its endpoint ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the lower node id to the higher one
    Ascending,
    Descending,
}

/// Edge id with the traversal direction packed into the top bit.
///
/// The bit is set when the presented base node id is greater than the adjacent one.
/// Edge ids therefore must stay below 2^31; larger ids are rejected with
/// [`SearchError::EdgeIdOverflow`] instead of silently aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectedEdgeKey(u32);

impl DirectedEdgeKey {
    pub fn new(edge: EdgeId, base: NodeId, adj: NodeId) -> Result<Self, SearchError> {
        if edge & DIRECTION_BIT != 0 {
            return Err(SearchError::EdgeIdOverflow(edge));
        }
        Ok(if base > adj {
            Self(edge | DIRECTION_BIT)
        } else {
            Self(edge)
        })
    }

    pub fn from_cursor(cursor: &EdgeCursor) -> Result<Self, SearchError> {
        Self::new(cursor.edge, cursor.base, cursor.adj)
    }

    pub fn edge(self) -> EdgeId {
        self.0 & !DIRECTION_BIT
    }

    pub fn direction(self) -> Direction {
        if self.0 & DIRECTION_BIT == 0 {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A tentative label: reached `end_node` over `edge` with cumulative `weight`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierEntry {
    /// None only for the root entry at the start node
    pub edge: Option<EdgeId>,
    pub end_node: NodeId,
    pub weight: f64,
    pub parent: Option<EntryId>,
}

/// Notified whenever a directed edge gets a new or better label.
/// Hook for a bidirectional driver to detect meeting points.
pub trait RelaxationObserver {
    /// `via` is the node the edge was entered from, the end node of the settled parent
    fn relaxed(&mut self, key: DirectedEdgeKey, entry: &FrontierEntry, via: NodeId);
}

impl RelaxationObserver for () {
    fn relaxed(&mut self, _key: DirectedEdgeKey, _entry: &FrontierEntry, _via: NodeId) {}
}

/// Outcome of one query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// None when the target is unreachable
    pub path: Option<Path>,
    /// Heap pops, the root entry included
    pub visited_nodes: usize,
    /// Distinct directed edges that received a label
    pub settled_keys: usize,
}

impl SearchReport {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Single-use search state
pub struct EdgeBasedDijkstra<'a, G: ?Sized, C: ?Sized> {
    graph: &'a G,
    cost: &'a C,
    entries: Vec<FrontierEntry>,
    best: FxHashMap<DirectedEdgeKey, EntryId>,
    heap: PriorityQueue<EntryId, Reverse<OrderedFloat<f64>>>,
    visited_nodes: usize,
}

impl<'a, G, C> EdgeBasedDijkstra<'a, G, C>
where
    G: Graph + ?Sized,
    C: CostModel + ?Sized,
{
    pub fn new(graph: &'a G, cost: &'a C) -> Self {
        Self {
            graph,
            cost,
            entries: Vec::new(),
            best: FxHashMap::default(),
            heap: PriorityQueue::new(),
            visited_nodes: 0,
        }
    }

    pub fn calc_path(self, from: NodeId, to: NodeId) -> Result<SearchReport, SearchError> {
        self.calc_path_observed(from, to, &mut ())
    }

    pub fn calc_path_observed<O>(
        mut self,
        from: NodeId,
        to: NodeId,
        observer: &mut O,
    ) -> Result<SearchReport, SearchError>
    where
        O: RelaxationObserver + ?Sized,
    {
        let node_count = self.graph.node_count();
        for node in [from, to] {
            if node as usize >= node_count {
                return Err(SearchError::NodeOutOfBounds { node, node_count });
            }
        }

        let root = self.push_entry(FrontierEntry {
            edge: None,
            end_node: from,
            weight: 0.0,
            parent: None,
        });
        self.heap.push(root, Reverse(OrderedFloat(0.0)));

        let goal = loop {
            let Some((current, _)) = self.heap.pop() else {
                break None;
            };
            self.visited_nodes += 1;

            let entry = self.entries[current];
            if entry.end_node == to {
                break Some(current);
            }
            self.relax(current, entry, observer)?;
        };

        debug!(
            "edge-based search {from} -> {to}: visited {} settled {} found {}",
            self.visited_nodes,
            self.best.len(),
            goal.is_some()
        );

        Ok(SearchReport {
            path: goal.map(|goal| Path::extract(self.graph, &self.entries, goal)),
            visited_nodes: self.visited_nodes,
            settled_keys: self.best.len(),
        })
    }

    fn relax<O>(
        &mut self,
        current: EntryId,
        entry: FrontierEntry,
        observer: &mut O,
    ) -> Result<(), SearchError>
    where
        O: RelaxationObserver + ?Sized,
    {
        let graph = self.graph;
        let cost = self.cost;

        for cursor in graph.edges(entry.end_node) {
            if !cost.accept(&cursor) || entry.edge == Some(cursor.edge) {
                continue;
            }

            let key = DirectedEdgeKey::from_cursor(&cursor)?;
            let tentative = cost.traversal_weight(cursor.distance, cursor.flags)
                + entry.weight
                + cost.turn_cost(entry.end_node, entry.edge, cursor.edge);
            if tentative.is_infinite() {
                continue;
            }

            let existing = self.best.get(&key).copied();
            let id = match existing {
                None => {
                    let id = self.push_entry(FrontierEntry {
                        edge: Some(cursor.edge),
                        end_node: cursor.adj,
                        weight: tentative,
                        parent: Some(current),
                    });
                    self.best.insert(key, id);
                    id
                }
                Some(id) if tentative < self.entries[id].weight => {
                    let label = &mut self.entries[id];
                    label.weight = tentative;
                    label.parent = Some(current);
                    id
                }
                Some(_) => continue,
            };

            // re-pushing an existing id moves it to its new priority
            self.heap.push(id, Reverse(OrderedFloat(tentative)));
            observer.relaxed(key, &self.entries[id], entry.end_node);
        }

        Ok(())
    }

    fn push_entry(&mut self, entry: FrontierEntry) -> EntryId {
        self.entries.push(entry);
        self.entries.len() - 1
    }
}

/// Cheapest path from `from` to `to`
pub fn search<G, C>(graph: &G, cost: &C, from: NodeId, to: NodeId) -> Result<SearchReport, SearchError>
where
    G: Graph + ?Sized,
    C: CostModel + ?Sized,
{
    EdgeBasedDijkstra::new(graph, cost).calc_path(from, to)
}

/// [`search`] with a relaxation hook
pub fn search_observed<G, C, O>(
    graph: &G,
    cost: &C,
    from: NodeId,
    to: NodeId,
    observer: &mut O,
) -> Result<SearchReport, SearchError>
where
    G: Graph + ?Sized,
    C: CostModel + ?Sized,
    O: RelaxationObserver + ?Sized,
{
    EdgeBasedDijkstra::new(graph, cost).calc_path_observed(from, to, observer)
}
