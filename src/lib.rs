//! # Butterfly-edgeroute
//!
//! Imports OpenStreetMap data into a compact road graph and answers turn-aware
//! shortest-path queries on it.
//!
//! ```no_run
//! use butterfly_edgeroute::ingest::{IngestConfig, LogObserver, OsmImport};
//! use butterfly_edgeroute::profiles::CarProfile;
//! use butterfly_edgeroute::prune::LargestComponentPruner;
//! use butterfly_edgeroute::reader::PbfSource;
//! use butterfly_edgeroute::routing::{search, VehicleCostModel, Weighting};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestConfig::default();
//! let import = OsmImport::new(&config, &CarProfile, LargestComponentPruner);
//! let report = import.run(&PbfSource::new("monaco-latest.osm.pbf"), &mut LogObserver)?;
//!
//! let cost = VehicleCostModel::new(Weighting::Fastest);
//! let result = search(&report.graph, &cost, 0, 42)?;
//! if let Some(path) = result.path {
//!     println!("{} m over {} edges", path.distance, path.edges.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod profiles;
pub mod prune;
pub mod reader;
pub mod routing;
pub mod storage;

pub use config::GraphConfig;
pub use error::{ConfigError, IngestError, SearchError, StorageError};
pub use ingest::{build_graph, IngestConfig, OsmImport};
pub use routing::{search, Path, SearchReport};
pub use storage::{Graph, GraphStorage};
