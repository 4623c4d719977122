//! Built-in vehicle encoders for different travel modes
//!
//! Each encoder turns way tags into [`EdgeFlags`]: access per direction and a speed.

pub mod bike;
pub mod car;
pub mod foot;
pub mod tag_lookup;

pub use bike::BikeProfile;
pub use car::CarProfile;
pub use foot::FootProfile;
pub use tag_lookup::TagLookup;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::EdgeFlags;

/// Derives edge flags from way tags
pub trait VehicleEncoder {
    fn name(&self) -> &'static str;

    /// Flags for a way in its drawing direction, None if the vehicle cannot use it at all
    fn way_flags(&self, tags: &TagLookup<'_>) -> Option<EdgeFlags>;

    fn accept_way(&self, tags: &TagLookup<'_>) -> bool {
        self.way_flags(tags).is_some()
    }

    /// Upper bound of any speed this encoder produces
    fn max_speed_kmh(&self) -> u32;
}

/// Vehicle selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    #[default]
    Car,
    Bike,
    Foot,
}

impl FromStr for Vehicle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "car" => Ok(Vehicle::Car),
            "bike" | "bicycle" => Ok(Vehicle::Bike),
            "foot" => Ok(Vehicle::Foot),
            _ => Err(ConfigError::UnknownValue {
                kind: "vehicle",
                value: s.to_string(),
            }),
        }
    }
}

impl VehicleEncoder for Vehicle {
    fn name(&self) -> &'static str {
        match self {
            Vehicle::Car => CarProfile.name(),
            Vehicle::Bike => BikeProfile.name(),
            Vehicle::Foot => FootProfile.name(),
        }
    }

    fn way_flags(&self, tags: &TagLookup<'_>) -> Option<EdgeFlags> {
        match self {
            Vehicle::Car => CarProfile.way_flags(tags),
            Vehicle::Bike => BikeProfile.way_flags(tags),
            Vehicle::Foot => FootProfile.way_flags(tags),
        }
    }

    fn max_speed_kmh(&self) -> u32 {
        match self {
            Vehicle::Car => CarProfile.max_speed_kmh(),
            Vehicle::Bike => BikeProfile.max_speed_kmh(),
            Vehicle::Foot => FootProfile.max_speed_kmh(),
        }
    }
}

/// Helper: check if access is denied
pub(crate) fn is_denied(value: Option<&str>) -> bool {
    matches!(value, Some("no") | Some("private"))
}
