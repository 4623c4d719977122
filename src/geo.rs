use geo::HaversineDistance;
use geo::Point;
use rstar::{primitives::GeomWithData, RTree};
use serde::{Deserialize, Serialize};

use crate::storage::{Graph, NodeId};

/// Great-circle distance in meters between two (lat, lon) points
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

/// Axis-aligned latitude/longitude box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// The whole globe. Default processing bounds.
    pub fn world() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    /// Inverted box that any `extend` call will replace
    pub fn empty() -> Self {
        Self::new(f64::MAX, f64::MIN, f64::MAX, f64::MIN)
    }

    pub fn is_empty(&self) -> bool {
        self.min_lat > self.max_lat || self.min_lon > self.max_lon
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::world()
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "[empty]");
        }
        write!(
            f,
            "[{:.5},{:.5} .. {:.5},{:.5}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// Nearest-node lookup over a finished graph using an R-tree
pub struct NodeLocator {
    rtree: RTree<GeomWithData<[f64; 2], NodeId>>,
}

impl NodeLocator {
    pub fn new<G: Graph>(graph: &G) -> Self {
        let points: Vec<GeomWithData<[f64; 2], NodeId>> = (0..graph.node_count() as NodeId)
            .filter_map(|node| {
                graph
                    .coordinate(node)
                    .map(|(lat, lon)| GeomWithData::new([lon, lat], node)) // [lon, lat]
            })
            .collect();

        Self {
            rtree: RTree::bulk_load(points),
        }
    }

    /// Closest graph node to (lat, lon), None for an empty graph
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<NodeId> {
        self.rtree
            .nearest_neighbor(&[lon, lat])
            .map(|point| point.data)
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_bbox_extend_and_contains() {
        let mut bbox = BBox::empty();
        assert!(bbox.is_empty());

        bbox.extend(43.73, 7.42);
        bbox.extend(43.75, 7.44);
        assert!(!bbox.is_empty());
        assert!(bbox.contains(43.74, 7.43));
        assert!(!bbox.contains(43.76, 7.43));
        assert!(BBox::world().contains(-89.9, 179.9));
    }
}
