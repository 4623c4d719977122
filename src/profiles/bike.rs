//! Bicycle encoder - tag semantics for bicycle routing

use super::{is_denied, TagLookup, VehicleEncoder};
use crate::storage::EdgeFlags;

pub struct BikeProfile;

impl VehicleEncoder for BikeProfile {
    fn name(&self) -> &'static str {
        "bike"
    }

    fn way_flags(&self, tags: &TagLookup<'_>) -> Option<EdgeFlags> {
        let highway = tags.get_str("highway")?;

        let speed_kmh = match highway {
            "cycleway" => 20,
            "path" | "footway" => 15,
            "residential" | "unclassified" | "tertiary" | "secondary" | "primary" => 18,
            "service" | "living_street" => 15,
            "track" => 12,
            // trunk and motorways are generally closed to bikes
            _ => return None,
        };

        let bicycle = tags.get_str("bicycle");
        if is_denied(bicycle) || bicycle == Some("dismount") {
            return None;
        }

        // Bikes are not affected by oneway for cars unless explicitly stated
        let backward = !tags.is_yes("oneway:bicycle");

        Some(EdgeFlags::new(true, backward, speed_kmh))
    }

    fn max_speed_kmh(&self) -> u32 {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bike_ignores_car_oneway() {
        let tags = vec![
            ("highway".to_string(), "residential".to_string()),
            ("oneway".to_string(), "yes".to_string()),
        ];
        let f = BikeProfile.way_flags(&TagLookup::new(&tags)).unwrap();
        assert!(f.forward() && f.backward());
        assert_eq!(f.speed_kmh(), 18);
    }

    #[test]
    fn test_bike_denied() {
        let tags = vec![
            ("highway".to_string(), "cycleway".to_string()),
            ("bicycle".to_string(), "dismount".to_string()),
        ];
        assert!(!BikeProfile.accept_way(&TagLookup::new(&tags)));
    }
}
