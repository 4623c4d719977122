//! Graph configuration: YAML file plus command line overrides

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geo::BBox;
use crate::ingest::{IngestConfig, ProgressConfig};
use crate::profiles::Vehicle;
use crate::routing::Weighting;

/// Settings for importing and querying one graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// OSM PBF file to import
    pub osm: Option<PathBuf>,
    /// Where the graph file lives. Derived from `osm` when unset.
    pub graph_location: Option<PathBuf>,
    /// Store sizing hint. Derived from the data when unset.
    pub expected_nodes: Option<i64>,
    pub sort_graph: bool,
    pub vehicle: Vehicle,
    pub weighting: Weighting,
    /// Only nodes inside are imported
    pub bounds: Option<BBox>,
    pub progress: ProgressConfig,
}

/// Values given on the command line. Set fields win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub osm: Option<PathBuf>,
    pub graph_location: Option<PathBuf>,
    pub expected_nodes: Option<i64>,
    pub sort_graph: Option<bool>,
    pub vehicle: Option<Vehicle>,
    pub weighting: Option<Weighting>,
}

impl GraphConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if overrides.osm.is_some() {
            self.osm = overrides.osm;
        }
        if overrides.graph_location.is_some() {
            self.graph_location = overrides.graph_location;
        }
        if overrides.expected_nodes.is_some() {
            self.expected_nodes = overrides.expected_nodes;
        }
        if let Some(sort) = overrides.sort_graph {
            self.sort_graph = sort;
        }
        if let Some(vehicle) = overrides.vehicle {
            self.vehicle = vehicle;
        }
        if let Some(weighting) = overrides.weighting {
            self.weighting = weighting;
        }
        self
    }

    /// Configured graph location, or `<osm file without extension>-gh.bin` next to it
    pub fn graph_location(&self) -> Result<PathBuf, ConfigError> {
        if let Some(location) = &self.graph_location {
            return Ok(location.clone());
        }
        let osm = self.osm.as_ref().ok_or(ConfigError::MissingSource)?;
        Ok(default_graph_location(osm))
    }

    /// The OSM file, which must exist
    pub fn osm_source(&self) -> Result<&Path, ConfigError> {
        let osm = self.osm.as_deref().ok_or(ConfigError::MissingSource)?;
        if !osm.exists() {
            return Err(ConfigError::SourceNotFound(osm.to_path_buf()));
        }
        Ok(osm)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            expected_nodes: self.expected_nodes,
            bounds: self.bounds.unwrap_or_default(),
            progress: self.progress,
            sort_graph: self.sort_graph,
        }
    }
}

fn default_graph_location(osm: &Path) -> PathBuf {
    let name = osm
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".gz").unwrap_or(&name);
    let stem = stem.strip_suffix(".pbf").unwrap_or(stem);
    let stem = stem.strip_suffix(".osm").unwrap_or(stem);
    osm.with_file_name(format!("{stem}-gh.bin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "osm: monaco.osm.pbf\nvehicle: bike\nweighting: shortest\nexpected_nodes: 5000\n\
             bounds:\n  min_lat: 43.7\n  max_lat: 43.8\n  min_lon: 7.4\n  max_lon: 7.5\n\
             progress:\n  way_log_interval: 10"
        )
        .unwrap();

        let config = GraphConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.vehicle, Vehicle::Bike);
        assert_eq!(config.weighting, Weighting::Shortest);
        assert_eq!(config.expected_nodes, Some(5000));
        assert_eq!(config.progress.way_log_interval, 10);
        assert_eq!(config.progress.node_log_interval, 10_000_000);
        assert!(config.bounds.unwrap().contains(43.75, 7.45));
        assert!(!config.sort_graph);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "osm_file: monaco.osm.pbf").unwrap();
        assert!(matches!(
            GraphConfig::from_yaml_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GraphConfig::from_yaml_file("/nonexistent/config.yml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_overrides_win() {
        let config = GraphConfig {
            vehicle: Vehicle::Foot,
            expected_nodes: Some(10),
            ..GraphConfig::default()
        }
        .merge(ConfigOverrides {
            vehicle: Some(Vehicle::Car),
            sort_graph: Some(true),
            ..ConfigOverrides::default()
        });

        assert_eq!(config.vehicle, Vehicle::Car);
        assert_eq!(config.expected_nodes, Some(10));
        assert!(config.sort_graph);
        assert!(config.ingest_config().sort_graph);
    }

    #[test]
    fn test_graph_location() {
        let config = GraphConfig {
            osm: Some(PathBuf::from("/data/monaco.osm.pbf")),
            ..GraphConfig::default()
        };
        assert_eq!(
            config.graph_location().unwrap(),
            PathBuf::from("/data/monaco-gh.bin")
        );
        assert_eq!(
            default_graph_location(Path::new("/data/monaco.osm.gz")),
            PathBuf::from("/data/monaco-gh.bin")
        );

        let config = GraphConfig {
            graph_location: Some(PathBuf::from("graph.bin")),
            ..GraphConfig::default()
        };
        assert_eq!(config.graph_location().unwrap(), PathBuf::from("graph.bin"));

        assert!(matches!(
            GraphConfig::default().graph_location(),
            Err(ConfigError::MissingSource)
        ));
    }

    #[test]
    fn test_osm_source_must_exist() {
        let config = GraphConfig {
            osm: Some(PathBuf::from("/nonexistent/map.osm.pbf")),
            ..GraphConfig::default()
        };
        assert!(matches!(
            config.osm_source(),
            Err(ConfigError::SourceNotFound(_))
        ));
    }
}
