//! Edge-based routing: cost model, search and path extraction

pub mod edge_dijkstra;
pub mod path;

pub use edge_dijkstra::{
    search, search_observed, DirectedEdgeKey, Direction, EdgeBasedDijkstra, EntryId,
    FrontierEntry, RelaxationObserver, SearchReport,
};
pub use path::Path;

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::{EdgeCursor, EdgeFlags, EdgeId, NodeId};

/// Everything the search needs to know about cost.
///
/// Weights and turn costs must be non-negative. An infinite turn cost forbids the turn.
pub trait CostModel {
    /// Whether the edge may be traversed in the direction it is presented
    fn accept(&self, edge: &EdgeCursor) -> bool;

    fn traversal_weight(&self, distance: f64, flags: EdgeFlags) -> f64;

    /// Cost of entering `outgoing` at `via`, coming from `incoming`.
    /// `incoming` is None at the start node.
    fn turn_cost(&self, via: NodeId, incoming: Option<EdgeId>, outgoing: EdgeId) -> f64;
}

/// How an edge's weight is derived from its length and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Meters
    Shortest,
    /// Seconds at the edge's speed
    #[default]
    Fastest,
}

impl Weighting {
    pub fn weight(self, distance: f64, flags: EdgeFlags) -> f64 {
        match self {
            Weighting::Shortest => distance,
            Weighting::Fastest => {
                let speed = flags.speed_kmh();
                if speed == 0 {
                    f64::INFINITY
                } else {
                    distance / (speed as f64 / 3.6)
                }
            }
        }
    }
}

impl FromStr for Weighting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shortest" => Ok(Weighting::Shortest),
            "fastest" => Ok(Weighting::Fastest),
            _ => Err(ConfigError::UnknownValue {
                kind: "weighting",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Shortest => f.write_str("shortest"),
            Weighting::Fastest => f.write_str("fastest"),
        }
    }
}

/// Cost of a transition between two edges at a shared node
pub trait TurnCosts {
    fn cost(&self, via: NodeId, incoming: EdgeId, outgoing: EdgeId) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoTurnCosts;

impl TurnCosts for NoTurnCosts {
    fn cost(&self, _via: NodeId, _incoming: EdgeId, _outgoing: EdgeId) -> f64 {
        0.0
    }
}

/// Explicit turn costs and restrictions. Unlisted turns are free.
#[derive(Debug, Clone, Default)]
pub struct TurnCostTable {
    costs: FxHashMap<(NodeId, EdgeId, EdgeId), f64>,
}

impl TurnCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, via: NodeId, incoming: EdgeId, outgoing: EdgeId, cost: f64) {
        self.costs.insert((via, incoming, outgoing), cost);
    }

    /// Forbid the turn entirely
    pub fn restrict(&mut self, via: NodeId, incoming: EdgeId, outgoing: EdgeId) {
        self.set(via, incoming, outgoing, f64::INFINITY);
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

impl TurnCosts for TurnCostTable {
    fn cost(&self, via: NodeId, incoming: EdgeId, outgoing: EdgeId) -> f64 {
        self.costs
            .get(&(via, incoming, outgoing))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Cost model built from a weighting and a turn cost provider.
/// Edges are usable where their flags grant forward access.
#[derive(Debug, Clone)]
pub struct VehicleCostModel<T = NoTurnCosts> {
    weighting: Weighting,
    turn_costs: T,
}

impl VehicleCostModel<NoTurnCosts> {
    pub fn new(weighting: Weighting) -> Self {
        Self {
            weighting,
            turn_costs: NoTurnCosts,
        }
    }
}

impl<T: TurnCosts> VehicleCostModel<T> {
    pub fn with_turn_costs<U: TurnCosts>(self, turn_costs: U) -> VehicleCostModel<U> {
        VehicleCostModel {
            weighting: self.weighting,
            turn_costs,
        }
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }
}

impl<T: TurnCosts> CostModel for VehicleCostModel<T> {
    fn accept(&self, edge: &EdgeCursor) -> bool {
        edge.flags.forward()
            && (self.weighting == Weighting::Shortest || edge.flags.speed_kmh() > 0)
    }

    fn traversal_weight(&self, distance: f64, flags: EdgeFlags) -> f64 {
        self.weighting.weight(distance, flags)
    }

    fn turn_cost(&self, via: NodeId, incoming: Option<EdgeId>, outgoing: EdgeId) -> f64 {
        match incoming {
            Some(incoming) => self.turn_costs.cost(via, incoming, outgoing),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastest_weight_in_seconds() {
        let flags = EdgeFlags::new(true, true, 36);
        assert!((Weighting::Fastest.weight(100.0, flags) - 10.0).abs() < 1e-9);
        assert_eq!(Weighting::Shortest.weight(100.0, flags), 100.0);
    }

    #[test]
    fn test_weighting_from_str() {
        assert_eq!("Fastest".parse::<Weighting>().unwrap(), Weighting::Fastest);
        assert!(matches!(
            "scenic".parse::<Weighting>(),
            Err(ConfigError::UnknownValue { kind: "weighting", .. })
        ));
    }

    #[test]
    fn test_turn_cost_table() {
        let mut table = TurnCostTable::new();
        table.set(1, 0, 2, 5.0);
        table.restrict(1, 2, 0);

        let model = VehicleCostModel::new(Weighting::Shortest).with_turn_costs(table);
        assert_eq!(model.turn_cost(1, Some(0), 2), 5.0);
        assert!(model.turn_cost(1, Some(2), 0).is_infinite());
        assert_eq!(model.turn_cost(1, Some(0), 3), 0.0);
        assert_eq!(model.turn_cost(1, None, 2), 0.0);
    }

    #[test]
    fn test_accept_needs_forward_access() {
        let model = VehicleCostModel::new(Weighting::Fastest);
        let mut edge = EdgeCursor {
            edge: 0,
            base: 0,
            adj: 1,
            distance: 10.0,
            flags: EdgeFlags::new(false, true, 50),
        };
        assert!(!model.accept(&edge));
        edge.flags = edge.flags.reversed();
        assert!(model.accept(&edge));
    }
}
