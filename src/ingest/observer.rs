//! Progress hooks for the import pipeline
//!
//! The importer never writes to an output channel itself. It reports checkpoints to an
//! [`IngestObserver`]; [`LogObserver`] turns them into log lines.

use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::prune::PruneReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Classify,
    Build,
    Prune,
    Optimize,
    Sort,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Classify => "classify",
            Phase::Build => "build",
            Phase::Prune => "prune",
            Phase::Optimize => "optimize",
            Phase::Sort => "sort",
        };
        f.write_str(name)
    }
}

/// Counters at a checkpoint of the build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestProgress {
    /// Elements read so far, nodes and ways
    pub elements: u64,
    /// In-bounds node locations
    pub locations: u64,
    /// Nodes outside the processing bounds
    pub skipped_locations: u64,
    /// Ways accepted by the encoder
    pub ways: u64,
    pub edges: u64,
}

/// Checkpoint intervals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Report node progress every this many elements
    pub node_log_interval: u64,
    /// Report way progress every this many ways
    pub way_log_interval: u64,
    /// Ways in the throughput sample window
    pub slow_way_sample: u64,
    /// Longest acceptable time for the sample window, in seconds
    pub slow_way_max_secs: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            node_log_interval: 10_000_000,
            way_log_interval: 1_000_000,
            slow_way_sample: 10_000,
            slow_way_max_secs: 1.0,
        }
    }
}

/// Receives import checkpoints. Every method defaults to doing nothing.
pub trait IngestObserver {
    fn phase_started(&mut self, _phase: Phase) {}

    fn phase_finished(&mut self, _phase: Phase, _elapsed: Duration) {}

    /// First way element seen during the build pass
    fn ways_started(&mut self, _progress: &IngestProgress) {}

    fn progress(&mut self, _progress: &IngestProgress) {}

    /// Way throughput fell below the configured minimum. Import continues.
    fn slow_ways(&mut self, _ways: u64, _elapsed: Duration) {}

    fn pruned(&mut self, _report: &PruneReport) {}
}

impl IngestObserver for () {}

/// Observer writing checkpoints through the `log` facade
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestObserver for LogObserver {
    fn phase_started(&mut self, phase: Phase) {
        info!("start {phase}");
    }

    fn phase_finished(&mut self, phase: Phase, elapsed: Duration) {
        info!("finished {phase} in {:.2}s", elapsed.as_secs_f64());
    }

    fn ways_started(&mut self, progress: &IngestProgress) {
        info!("{}, now parsing ways", progress.elements);
    }

    fn progress(&mut self, p: &IngestProgress) {
        info!(
            "{}, locs: {} ({}), edges: {}",
            p.elements, p.locations, p.skipped_locations, p.edges
        );
    }

    fn slow_ways(&mut self, ways: u64, elapsed: Duration) {
        warn!(
            "Something is wrong! Processing ways takes too long! {:.2}s for only {} entries",
            elapsed.as_secs_f64(),
            ways
        );
    }

    fn pruned(&mut self, r: &PruneReport) {
        info!(
            "there were {} sub-networks. removed them => {} less nodes. Remaining subnetworks: {}",
            r.subnetworks, r.removed_nodes, r.remaining_subnetworks
        );
    }
}
