//! Pass 1: decide which referenced nodes are graph vertices

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::IngestError;
use crate::profiles::{TagLookup, VehicleEncoder};
use crate::reader::{Element, ElementError, ElementSource};

/// Saturating reference count. Endpoints jump straight to [`TOWER`].
const TOWER: u8 = 2;

/// Tower/pillar split of every node referenced by an accepted way
#[derive(Debug, Clone, Default)]
pub struct NodeClassification {
    refs: FxHashMap<i64, u8>,
    accepted_ways: u64,
    skipped_elements: u64,
}

impl NodeClassification {
    /// Node is a graph vertex: a way endpoint or referenced at least twice
    pub fn is_tower(&self, osm_id: i64) -> bool {
        self.refs.get(&osm_id).is_some_and(|&c| c >= TOWER)
    }

    /// Node only shapes the geometry between two towers
    pub fn is_pillar(&self, osm_id: i64) -> bool {
        self.refs.get(&osm_id).is_some_and(|&c| c < TOWER)
    }

    pub fn is_referenced(&self, osm_id: i64) -> bool {
        self.refs.contains_key(&osm_id)
    }

    /// Distinct nodes referenced by accepted ways, towers and pillars alike
    pub fn referenced_nodes(&self) -> u64 {
        self.refs.len() as u64
    }

    pub fn tower_nodes(&self) -> u64 {
        self.refs.values().filter(|&&c| c >= TOWER).count() as u64
    }

    pub fn accepted_ways(&self) -> u64 {
        self.accepted_ways
    }

    /// Malformed elements skipped during the pass
    pub fn skipped_elements(&self) -> u64 {
        self.skipped_elements
    }

    fn count_way(&mut self, refs: &[i64]) {
        let last = refs.len().saturating_sub(1);
        for (i, &id) in refs.iter().enumerate() {
            let count = self.refs.entry(id).or_insert(0);
            if i == 0 || i == last {
                *count = TOWER;
            } else {
                *count = count.saturating_add(1);
            }
        }
        self.accepted_ways += 1;
    }
}

/// Scan the whole source once, counting node references of ways the encoder accepts
pub fn classify<S, E>(source: &S, encoder: &E) -> Result<NodeClassification, IngestError>
where
    S: ElementSource + ?Sized,
    E: VehicleEncoder + ?Sized,
{
    let mut classification = NodeClassification::default();
    let elements = source
        .elements()
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;

    for element in elements {
        match element {
            Ok(Element::Way(way)) => {
                if way.refs.len() >= 2 && encoder.accept_way(&TagLookup::new(&way.tags)) {
                    classification.count_way(&way.refs);
                }
            }
            Ok(Element::Node(_)) => {}
            Err(ElementError::Unreadable(msg)) => return Err(IngestError::Unreadable(msg)),
            Err(e) => {
                debug!("skipping element during classification: {e}");
                classification.skipped_elements += 1;
            }
        }
    }

    Ok(classification)
}
