//! OSM import: classify, build, prune, compact
//!
//! [`build_graph`] runs the two passes and returns the raw graph. [`OsmImport`] wraps it
//! with subnetwork pruning, compaction and the optional locality sort.

pub mod builder;
pub mod classify;
pub mod observer;

pub use builder::{BuildStats, GraphBuilder, MIN_EDGE_LENGTH};
pub use classify::{classify, NodeClassification};
pub use observer::{IngestObserver, IngestProgress, LogObserver, Phase, ProgressConfig};

use std::time::Instant;

use crate::error::IngestError;
use crate::geo::BBox;
use crate::profiles::VehicleEncoder;
use crate::prune::{PruneReport, SubnetworkPruner};
use crate::reader::ElementSource;
use crate::storage::{GraphStorage, MAX_INITIAL_CAPACITY};

/// Nodes per unit of initial store capacity
const CAPACITY_DIVISOR: i64 = 50;

/// Initial store capacity for a positive expected node count
fn initial_capacity(expected: i64) -> usize {
    usize::try_from(expected / CAPACITY_DIVISOR)
        .unwrap_or(0)
        .min(MAX_INITIAL_CAPACITY)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Expected node count used to size the store. Derived from pass 1 when unset.
    pub expected_nodes: Option<i64>,
    /// Nodes outside are skipped
    pub bounds: BBox,
    pub progress: ProgressConfig,
    /// Renumber nodes depth-first after compaction
    pub sort_graph: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            expected_nodes: None,
            bounds: BBox::world(),
            progress: ProgressConfig::default(),
            sort_graph: false,
        }
    }
}

/// Two-pass build of the raw graph, before any pruning
pub fn build_graph<S, E, O>(
    source: &S,
    config: &IngestConfig,
    encoder: &E,
    observer: &mut O,
) -> Result<(GraphStorage, BuildStats), IngestError>
where
    S: ElementSource + ?Sized,
    E: VehicleEncoder + ?Sized,
    O: IngestObserver + ?Sized,
{
    if let Some(expected) = config.expected_nodes {
        if expected <= 0 {
            return Err(IngestError::ExpectedNodes(expected));
        }
    }

    observer.phase_started(Phase::Classify);
    let started = Instant::now();
    let classification = classify(source, encoder)?;
    observer.phase_finished(Phase::Classify, started.elapsed());

    let expected = config
        .expected_nodes
        .unwrap_or(classification.referenced_nodes() as i64);
    if expected <= 0 {
        return Err(IngestError::ExpectedNodes(expected));
    }

    observer.phase_started(Phase::Build);
    let started = Instant::now();
    let result = builder::build(
        source,
        &classification,
        encoder,
        config.bounds,
        initial_capacity(expected),
        &config.progress,
        observer,
    )?;
    observer.phase_finished(Phase::Build, started.elapsed());

    Ok(result)
}

/// Result of a full import
#[derive(Debug)]
pub struct ImportReport {
    pub graph: GraphStorage,
    pub build: BuildStats,
    pub prune: PruneReport,
}

/// Full import pipeline: build, prune, optimize, optionally sort
pub struct OsmImport<'a, E: ?Sized, P> {
    config: &'a IngestConfig,
    encoder: &'a E,
    pruner: P,
}

impl<'a, E, P> OsmImport<'a, E, P>
where
    E: VehicleEncoder + ?Sized,
    P: SubnetworkPruner,
{
    pub fn new(config: &'a IngestConfig, encoder: &'a E, pruner: P) -> Self {
        Self {
            config,
            encoder,
            pruner,
        }
    }

    pub fn run<S, O>(&self, source: &S, observer: &mut O) -> Result<ImportReport, IngestError>
    where
        S: ElementSource + ?Sized,
        O: IngestObserver + ?Sized,
    {
        let (mut graph, build) = build_graph(source, self.config, self.encoder, observer)?;

        observer.phase_started(Phase::Prune);
        let started = Instant::now();
        let prune = self.pruner.prune(&mut graph);
        observer.pruned(&prune);
        observer.phase_finished(Phase::Prune, started.elapsed());

        observer.phase_started(Phase::Optimize);
        let started = Instant::now();
        graph.optimize();
        observer.phase_finished(Phase::Optimize, started.elapsed());

        if self.config.sort_graph {
            observer.phase_started(Phase::Sort);
            let started = Instant::now();
            graph = graph.sort_dfs();
            observer.phase_finished(Phase::Sort, started.elapsed());
        }

        Ok(ImportReport {
            graph,
            build,
            prune,
        })
    }
}
