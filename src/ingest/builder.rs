//! Pass 2: insert tower nodes and turn way segments into edges

use std::time::{Duration, Instant};

use log::{debug, error};
use rustc_hash::FxHashMap;

use super::classify::NodeClassification;
use super::observer::{IngestObserver, IngestProgress, ProgressConfig};
use crate::error::IngestError;
use crate::geo::{haversine_distance, BBox};
use crate::profiles::{TagLookup, VehicleEncoder};
use crate::reader::{Element, ElementError, ElementSource, NodeRecord, WayRecord};
use crate::storage::{EdgeFlags, Graph, GraphStorage, NodeId};

/// Shortest length an edge may have, in meters
pub const MIN_EDGE_LENGTH: f64 = 0.1;

/// Counters collected while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub elements: u64,
    /// In-bounds node locations seen
    pub locations: u64,
    /// Nodes dropped for lying outside the bounds
    pub skipped_locations: u64,
    /// Node elements dropped for an unparsable id
    pub malformed_nodes: u64,
    pub tower_nodes: u64,
    /// Ways the encoder accepted
    pub ways: u64,
    /// Ways the encoder rejected
    pub rejected_ways: u64,
    /// Accepted ways that produced no edge, plus way elements that could not be parsed
    pub dropped_ways: u64,
    pub edges: u64,
}

impl BuildStats {
    fn progress(&self) -> IngestProgress {
        IngestProgress {
            elements: self.elements,
            locations: self.locations,
            skipped_locations: self.skipped_locations,
            ways: self.ways,
            edges: self.edges,
        }
    }
}

/// Resolved position of a way reference
#[derive(Debug, Clone, Copy)]
enum Point {
    Tower(NodeId, f64, f64),
    Pillar(f64, f64),
}

impl Point {
    fn lat_lon(self) -> (f64, f64) {
        match self {
            Point::Tower(_, lat, lon) | Point::Pillar(lat, lon) => (lat, lon),
        }
    }
}

/// Builds a [`GraphStorage`] from a classified element stream
pub struct GraphBuilder<'a, E: ?Sized> {
    encoder: &'a E,
    classification: &'a NodeClassification,
    bounds: BBox,
    storage: GraphStorage,
    towers: FxHashMap<i64, NodeId>,
    pillars: FxHashMap<i64, (f64, f64)>,
    stats: BuildStats,
}

impl<'a, E: VehicleEncoder + ?Sized> GraphBuilder<'a, E> {
    pub fn new(
        encoder: &'a E,
        classification: &'a NodeClassification,
        bounds: BBox,
        capacity: usize,
    ) -> Self {
        Self {
            encoder,
            classification,
            bounds,
            storage: GraphStorage::with_capacity(capacity),
            towers: FxHashMap::default(),
            pillars: FxHashMap::default(),
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn process_node(&mut self, node: &NodeRecord) {
        if !self.bounds.contains(node.lat, node.lon) {
            self.stats.skipped_locations += 1;
            return;
        }
        self.stats.locations += 1;

        if self.classification.is_tower(node.id) {
            if !self.towers.contains_key(&node.id) {
                let id = self.storage.add_node(node.lat, node.lon, node.ele);
                self.towers.insert(node.id, id);
                self.stats.tower_nodes += 1;
            }
        } else if self.classification.is_pillar(node.id) {
            self.pillars.insert(node.id, (node.lat, node.lon));
        }
    }

    /// Append one edge per tower-to-tower segment of the way. Returns the edges added.
    pub fn process_way(&mut self, way: &WayRecord) -> Result<usize, IngestError> {
        let Some(flags) = self.encoder.way_flags(&TagLookup::new(&way.tags)) else {
            self.stats.rejected_ways += 1;
            return Ok(0);
        };
        self.stats.ways += 1;

        if way.refs.len() < 2 {
            self.stats.dropped_ways += 1;
            return Ok(0);
        }

        let mut added = 0;
        let mut start: Option<NodeId> = None;
        let mut last: Option<(f64, f64)> = None;
        let mut previous_ref: Option<i64> = None;
        let mut length = 0.0;

        for &osm_id in &way.refs {
            if previous_ref == Some(osm_id) {
                continue;
            }
            previous_ref = Some(osm_id);

            let Some(point) = self.resolve(osm_id) else {
                // missing node splits the way
                start = None;
                last = None;
                length = 0.0;
                continue;
            };

            let (lat, lon) = point.lat_lon();
            if let (Some(_), Some((plat, plon))) = (start, last) {
                length += haversine_distance(plat, plon, lat, lon);
            }
            last = Some((lat, lon));

            if let Point::Tower(node, _, _) = point {
                if let Some(from) = start {
                    self.add_segment(from, node, length, flags)?;
                    added += 1;
                }
                start = Some(node);
                length = 0.0;
            }
        }

        if added == 0 {
            debug!("way {} produced no edges", way.id);
            self.stats.dropped_ways += 1;
        }
        Ok(added)
    }

    pub fn finish(self) -> (GraphStorage, BuildStats) {
        (self.storage, self.stats)
    }

    fn resolve(&self, osm_id: i64) -> Option<Point> {
        if let Some(&node) = self.towers.get(&osm_id) {
            let (lat, lon) = self.storage.coordinate(node)?;
            return Some(Point::Tower(node, lat, lon));
        }
        self.pillars
            .get(&osm_id)
            .map(|&(lat, lon)| Point::Pillar(lat, lon))
    }

    fn add_segment(
        &mut self,
        from: NodeId,
        to: NodeId,
        length: f64,
        flags: EdgeFlags,
    ) -> Result<(), IngestError> {
        self.storage
            .add_edge(from, to, length.max(MIN_EDGE_LENGTH), flags)?;
        self.stats.edges += 1;
        Ok(())
    }
}

/// Run the second pass over `source`
pub fn build<S, E, O>(
    source: &S,
    classification: &NodeClassification,
    encoder: &E,
    bounds: BBox,
    capacity: usize,
    progress: &ProgressConfig,
    observer: &mut O,
) -> Result<(GraphStorage, BuildStats), IngestError>
where
    S: ElementSource + ?Sized,
    E: VehicleEncoder + ?Sized,
    O: IngestObserver + ?Sized,
{
    let mut builder = GraphBuilder::new(encoder, classification, bounds, capacity);
    let elements = source
        .elements()
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;

    let slow_way_max = Duration::from_secs_f64(progress.slow_way_max_secs.max(0.0));
    let mut ways_started: Option<Instant> = None;

    for element in elements {
        builder.stats.elements += 1;

        match element {
            Ok(Element::Node(node)) => {
                builder.process_node(&node);
                if progress.node_log_interval > 0
                    && builder.stats.elements % progress.node_log_interval == 0
                {
                    observer.progress(&builder.stats.progress());
                }
            }
            Ok(Element::Way(way)) => {
                let started = *ways_started.get_or_insert_with(|| {
                    observer.ways_started(&builder.stats.progress());
                    Instant::now()
                });

                let before = builder.stats.ways;
                builder.process_way(&way)?;

                // checkpoints count accepted ways only
                let ways = builder.stats.ways;
                if ways == before {
                    continue;
                }
                if ways == progress.slow_way_sample {
                    let elapsed = started.elapsed();
                    if elapsed > slow_way_max {
                        observer.slow_ways(ways, elapsed);
                    }
                }
                if progress.way_log_interval > 0 && ways % progress.way_log_interval == 0 {
                    observer.progress(&builder.stats.progress());
                }
            }
            Err(ElementError::MalformedId { raw }) => {
                error!("cannot get id from node: {raw}");
                builder.stats.malformed_nodes += 1;
            }
            Err(ElementError::MalformedCoordinate { id, lat, lon }) => {
                return Err(IngestError::MalformedCoordinate { id, lat, lon });
            }
            Err(ElementError::MalformedWay { raw }) => {
                debug!("skipping malformed way: {raw}");
                builder.stats.dropped_ways += 1;
            }
            Err(ElementError::Unreadable(msg)) => return Err(IngestError::Unreadable(msg)),
        }
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::classify::classify;
    use crate::profiles::CarProfile;
    use crate::reader::MemorySource;

    const ROAD: &[(&str, &str)] = &[("highway", "residential")];

    fn run(source: &MemorySource, bounds: BBox) -> Result<(GraphStorage, BuildStats), IngestError> {
        let classification = classify(source, &CarProfile)?;
        build(
            source,
            &classification,
            &CarProfile,
            bounds,
            16,
            &ProgressConfig::default(),
            &mut (),
        )
    }

    #[test]
    fn test_pillars_are_compressed_into_edge_length() {
        // 1 -- 2 -- 3, node 2 is a pillar
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .way(10, &[1, 2, 3], ROAD);

        let (graph, stats) = run(&source, BBox::world()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.tower_nodes, 2);

        let edge = graph.edges(0).next().unwrap();
        let direct = haversine_distance(0.0, 0.0, 0.0, 0.002);
        assert!((edge.distance - direct).abs() < 1e-6);
    }

    #[test]
    fn test_one_edge_per_tower_segment() {
        // way 10 is cut into three segments by the crossing ways
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .node(4, 0.0, 0.003)
            .node(5, 0.001, 0.001)
            .node(6, 0.001, 0.002)
            .way(10, &[1, 2, 3, 4], ROAD)
            .way(11, &[2, 5], ROAD)
            .way(12, &[3, 6], ROAD);

        let (graph, stats) = run(&source, BBox::world()).unwrap();
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(stats.edges, 5);
        for node in 0..graph.node_count() as NodeId {
            for edge in graph.edges(node) {
                assert!(edge.distance > 0.0);
            }
        }
    }

    #[test]
    fn test_duplicate_refs_and_missing_nodes() {
        // node 9 is never defined: the way is split there
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .node(4, 0.0, 0.003)
            .way(10, &[1, 1, 2, 9, 3, 4], ROAD)
            .way(11, &[2, 3], ROAD);

        let (graph, _) = run(&source, BBox::world()).unwrap();
        // 1-2 from way 10 (9 is unresolved, so 2..3 via 9 is lost), 3-4 and 2-3 from way 11
        assert_eq!(graph.edge_count(), 2 + 1);
    }

    #[test]
    fn test_out_of_bounds_nodes_are_skipped() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 10.0, 10.0)
            .way(10, &[1, 2], ROAD)
            .way(11, &[2, 3], ROAD);

        let bounds = BBox::new(-1.0, 1.0, -1.0, 1.0);
        let (graph, stats) = run(&source, bounds).unwrap();
        assert_eq!(stats.locations, 2);
        assert_eq!(stats.skipped_locations, 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.dropped_ways, 1);
    }

    #[test]
    fn test_malformed_id_skipped_malformed_coordinate_fatal() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .error(ElementError::MalformedId { raw: "abc".into() })
            .node(2, 0.0, 0.001)
            .way(10, &[1, 2], ROAD);
        let (graph, stats) = run(&source, BBox::world()).unwrap();
        assert_eq!(stats.malformed_nodes, 1);
        assert_eq!(graph.edge_count(), 1);

        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .error(ElementError::MalformedCoordinate {
                id: 2,
                lat: "north".into(),
                lon: "7.4".into(),
            })
            .way(10, &[1, 2], ROAD);
        match run(&source, BBox::world()) {
            Err(IngestError::MalformedCoordinate { id, lat, .. }) => {
                assert_eq!(id, 2);
                assert_eq!(lat, "north");
            }
            other => panic!("expected coordinate error, got {other:?}"),
        }
    }

    #[test]
    fn test_oneway_flags_follow_drawing_direction() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .way(10, &[2, 1], &[("highway", "residential"), ("oneway", "yes")]);

        let (graph, _) = run(&source, BBox::world()).unwrap();
        // node 1 is inserted first and gets id 0
        let from_second = graph.edges(1).next().unwrap();
        assert!(from_second.flags.forward());
        let from_first = graph.edges(0).next().unwrap();
        assert!(!from_first.flags.forward());
    }

    #[test]
    fn test_coincident_towers_get_minimum_length() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.0)
            .way(10, &[1, 2], ROAD);

        let (graph, _) = run(&source, BBox::world()).unwrap();
        let edge = graph.edges(0).next().unwrap();
        assert_eq!(edge.distance, MIN_EDGE_LENGTH);
    }

    #[test]
    fn test_rejected_ways_are_not_counted_as_accepted() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .way(10, &[1, 2], ROAD)
            .way(11, &[2, 3], &[("building", "yes")])
            .way(12, &[2, 3], &[("highway", "footway")])
            .way(13, &[3], ROAD);

        let (graph, stats) = run(&source, BBox::world()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.ways, 2);
        assert_eq!(stats.rejected_ways, 2);
        // the single-node way was accepted but produced nothing
        assert_eq!(stats.dropped_ways, 1);
    }

    #[derive(Default)]
    struct Recorder {
        ways_started: Option<u64>,
        progress: Vec<IngestProgress>,
        slow: Vec<u64>,
    }

    impl IngestObserver for Recorder {
        fn ways_started(&mut self, progress: &IngestProgress) {
            self.ways_started = Some(progress.elements);
        }

        fn progress(&mut self, progress: &IngestProgress) {
            self.progress.push(*progress);
        }

        fn slow_ways(&mut self, ways: u64, _elapsed: Duration) {
            self.slow.push(ways);
        }
    }

    fn build_recorded(source: &MemorySource, config: &ProgressConfig) -> (BuildStats, Recorder) {
        let classification = classify(source, &CarProfile).unwrap();
        let mut recorder = Recorder::default();
        let (_, stats) = build(
            source,
            &classification,
            &CarProfile,
            BBox::world(),
            4,
            config,
            &mut recorder,
        )
        .unwrap();
        (stats, recorder)
    }

    #[test]
    fn test_observer_checkpoints() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .way(10, &[1, 2], ROAD)
            .way(11, &[2, 1], ROAD);
        let config = ProgressConfig {
            node_log_interval: 2,
            way_log_interval: 1,
            ..ProgressConfig::default()
        };

        let (_, recorder) = build_recorded(&source, &config);
        assert_eq!(recorder.ways_started, Some(3));
        // one node checkpoint, two way checkpoints
        assert_eq!(recorder.progress.len(), 3);
        assert_eq!(recorder.progress[2].edges, 2);
        assert!(recorder.slow.is_empty());
    }

    #[test]
    fn test_slow_way_warning_fires_once() {
        // the rejected way between the two roads must not re-trigger the sample
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .node(3, 0.0, 0.002)
            .way(10, &[1, 2], ROAD)
            .way(11, &[2, 3], &[("building", "yes")])
            .way(12, &[2, 3], ROAD);
        let config = ProgressConfig {
            slow_way_sample: 1,
            slow_way_max_secs: 0.0,
            ..ProgressConfig::default()
        };

        let (stats, recorder) = build_recorded(&source, &config);
        assert_eq!(recorder.slow, vec![1]);
        assert_eq!(stats.edges, 2);
    }

    #[test]
    fn test_fast_ways_do_not_warn() {
        let source = MemorySource::new()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.001)
            .way(10, &[1, 2], ROAD);
        let config = ProgressConfig {
            slow_way_sample: 1,
            slow_way_max_secs: 3600.0,
            ..ProgressConfig::default()
        };

        let (_, recorder) = build_recorded(&source, &config);
        assert!(recorder.slow.is_empty());
    }
}
