//! Pedestrian encoder - tag semantics for walking

use super::{is_denied, TagLookup, VehicleEncoder};
use crate::storage::EdgeFlags;

pub struct FootProfile;

impl VehicleEncoder for FootProfile {
    fn name(&self) -> &'static str {
        "foot"
    }

    fn way_flags(&self, tags: &TagLookup<'_>) -> Option<EdgeFlags> {
        let highway = tags.get_str("highway")?;

        let accessible = matches!(
            highway,
            "footway"
                | "pedestrian"
                | "steps"
                | "path"
                | "cycleway"
                | "residential"
                | "living_street"
                | "unclassified"
                | "tertiary"
                | "secondary"
                | "primary"
                | "service"
                | "track"
        );
        if !accessible || is_denied(tags.get_str("foot")) {
            return None;
        }

        // Pedestrians ignore oneway restrictions
        Some(EdgeFlags::new(true, true, 5))
    }

    fn max_speed_kmh(&self) -> u32 {
        5
    }
}
