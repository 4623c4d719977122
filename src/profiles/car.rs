//! Car encoder - tag semantics for automobile routing
//!
//! Implements access rules, speed limits and oneway handling for cars.

use super::{is_denied, TagLookup, VehicleEncoder};
use crate::storage::EdgeFlags;

const MAX_SPEED_KMH: u32 = 140;

pub struct CarProfile;

impl VehicleEncoder for CarProfile {
    fn name(&self) -> &'static str {
        "car"
    }

    fn way_flags(&self, tags: &TagLookup<'_>) -> Option<EdgeFlags> {
        let highway = tags.get_str("highway")?;

        let base_speed_kmh = match highway {
            "motorway" => 110.0,
            "motorway_link" => 60.0,
            "trunk" => 90.0,
            "trunk_link" => 50.0,
            "primary" => 70.0,
            "primary_link" => 40.0,
            "secondary" => 60.0,
            "secondary_link" => 40.0,
            "tertiary" => 50.0,
            "tertiary_link" => 30.0,
            "unclassified" => 50.0,
            "residential" => 30.0,
            "service" => 20.0,
            "living_street" => 10.0,
            // tracks, paths, construction and anything unknown
            _ => return None,
        };

        if is_denied(tags.get_str("motor_vehicle"))
            || is_denied(tags.get_str("vehicle"))
            || is_denied(tags.get_str("access"))
        {
            return None;
        }

        let mut forward = true;
        let mut backward = true;
        match tags.get_str("oneway") {
            Some("yes" | "1" | "true") => backward = false,
            Some("-1" | "reverse") => forward = false,
            Some("no") => {}
            _ => {
                // Motorways and roundabouts are oneway unless tagged otherwise
                if highway == "motorway"
                    || highway == "motorway_link"
                    || tags.get_str("junction") == Some("roundabout")
                {
                    backward = false;
                }
            }
        }

        let mut speed = tags.get_speed_kmh("maxspeed").unwrap_or(base_speed_kmh);
        if tags.get_str("route") == Some("ferry") {
            speed = 20.0;
        }
        // Free-flow speed is below the posted limit
        let speed = (speed * 0.9).round() as u32;

        Some(EdgeFlags::new(forward, backward, speed.clamp(5, MAX_SPEED_KMH)))
    }

    fn max_speed_kmh(&self) -> u32 {
        MAX_SPEED_KMH
    }
}
