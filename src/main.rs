//! # Butterfly-edgeroute CLI
//!
//! Imports OpenStreetMap PBF or XML files into a routing graph and runs turn-aware queries on it.

use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, Result};
use butterfly_edgeroute::config::{ConfigOverrides, GraphConfig};
use butterfly_edgeroute::geo::NodeLocator;
use butterfly_edgeroute::ingest::OsmImport;
use butterfly_edgeroute::profiles::{Vehicle, VehicleEncoder};
use butterfly_edgeroute::prune::LargestComponentPruner;
use butterfly_edgeroute::reader::{PbfSource, XmlSource};
use butterfly_edgeroute::routing::{search, Path, VehicleCostModel, Weighting};
use butterfly_edgeroute::storage::{Graph, GraphStorage};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;

mod cli;

/// Command-line interface for butterfly-edgeroute
#[derive(Parser)]
#[command(name = "butterfly-edgeroute")]
#[command(about = "OpenStreetMap graph import and turn-aware edge-based routing")]
#[command(long_about = "Builds a routing graph from an OSM file (.osm.pbf, .osm or .osm.gz) and queries it:
  butterfly-edgeroute import monaco-latest.osm.pbf
  butterfly-edgeroute route --from 43.7384,7.4246 --to 43.7311,7.4197
  butterfly-edgeroute info

Settings can also come from a YAML file given with --config;
command line flags override values from the file.")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Graph file location (default: <osm file>-gh.bin)
    #[arg(short, long, global = true)]
    graph: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a graph file from an OSM file
    Import {
        /// OSM file: .pbf is read as PBF, anything else as XML (.gz compressed or plain)
        osm: Option<PathBuf>,

        /// Rebuild even if the graph file already exists
        #[arg(short, long)]
        force: bool,

        /// Vehicle whose access rules shape the graph: car, bike or foot
        #[arg(long)]
        vehicle: Option<Vehicle>,

        /// Expected node count used to size the graph
        #[arg(long, allow_negative_numbers = true)]
        expected_nodes: Option<i64>,

        /// Renumber nodes depth-first for better memory locality
        #[arg(long)]
        sort: bool,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Find the cheapest route between two coordinates
    Route {
        /// Start as "lat,lon"
        #[arg(long, value_parser = cli::parse_lat_lon)]
        from: (f64, f64),

        /// Destination as "lat,lon"
        #[arg(long, value_parser = cli::parse_lat_lon)]
        to: (f64, f64),

        /// fastest or shortest
        #[arg(long)]
        weighting: Option<Weighting>,

        /// Print the route as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a summary of a graph file
    Info,
}

fn main() {
    if let Err(e) = run() {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let file_config = match &cli.config {
        Some(path) => GraphConfig::from_yaml_file(path)?,
        None => GraphConfig::default(),
    };
    let overrides = ConfigOverrides {
        graph_location: cli.graph.clone(),
        ..ConfigOverrides::default()
    };

    match cli.command {
        Command::Import {
            osm,
            force,
            vehicle,
            expected_nodes,
            sort,
            no_progress,
        } => {
            let config = file_config.merge(ConfigOverrides {
                osm,
                vehicle,
                expected_nodes,
                sort_graph: sort.then_some(true),
                ..overrides
            });
            import(&config, force, no_progress)
        }
        Command::Route {
            from,
            to,
            weighting,
            json,
        } => {
            let config = file_config.merge(ConfigOverrides {
                weighting,
                ..overrides
            });
            route(&config, from, to, json)
        }
        Command::Info => info_cmd(&file_config.merge(overrides)),
    }
}

fn import(config: &GraphConfig, force: bool, no_progress: bool) -> Result<()> {
    let location = config.graph_location()?;

    if location.exists() && !force {
        let graph = GraphStorage::load(&location)
            .with_context(|| format!("failed to load existing graph {}", location.display()))?;
        info!("graph already exists at {}, use --force to rebuild", location.display());
        eprintln!("📦 {graph}");
        return Ok(());
    }

    let osm = config.osm_source()?;
    eprintln!("🦋 Importing {} for {}", osm.display(), config.vehicle.name());

    let ingest = config.ingest_config();
    let import = OsmImport::new(&ingest, &config.vehicle, LargestComponentPruner);
    let mut progress = if no_progress {
        cli::ProgressManager::hidden()
    } else {
        cli::ProgressManager::new("reading map data...")
    };

    let report = if is_pbf(osm) {
        import.run(&PbfSource::new(osm), &mut progress)
    } else {
        import.run(&XmlSource::new(osm), &mut progress)
    }
    .with_context(|| format!("failed to import {}", osm.display()))?;
    progress.finish("✅ Import completed!");

    info!(
        "{} locations ({} outside bounds), {} ways ({} rejected, {} dropped)",
        report.build.locations,
        report.build.skipped_locations,
        report.build.ways,
        report.build.rejected_ways,
        report.build.dropped_ways
    );

    report
        .graph
        .save(&location)
        .with_context(|| format!("failed to save graph to {}", location.display()))?;

    eprintln!("📁 Saved to: {}", location.display());
    eprintln!("📦 {}", report.graph);
    Ok(())
}

fn is_pbf(osm: &FsPath) -> bool {
    osm.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pbf"))
}

/// Route as printed with --json
#[derive(Serialize)]
struct RouteOutput<'a> {
    weighting: Weighting,
    visited_nodes: usize,
    #[serde(flatten)]
    path: &'a Path,
    points: Vec<(f64, f64)>,
}

fn route(config: &GraphConfig, from: (f64, f64), to: (f64, f64), json: bool) -> Result<()> {
    let graph = load_graph(config)?;

    let locator = NodeLocator::new(&graph);
    let start = locator
        .nearest(from.0, from.1)
        .with_context(|| format!("no node found near {},{}", from.0, from.1))?;
    let target = locator
        .nearest(to.0, to.1)
        .with_context(|| format!("no node found near {},{}", to.0, to.1))?;

    let cost = VehicleCostModel::new(config.weighting);
    let report = search(&graph, &cost, start, target)?;
    info!(
        "visited {} nodes, {} directed edges",
        report.visited_nodes, report.settled_keys
    );

    let Some(path) = report.path else {
        anyhow::bail!("no route found between {},{} and {},{}", from.0, from.1, to.0, to.1);
    };

    if json {
        let output = RouteOutput {
            weighting: config.weighting,
            visited_nodes: report.visited_nodes,
            points: path.points(&graph),
            path: &path,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("distance: {:.1} m", path.distance);
        println!("weight: {:.1} ({})", path.weight, config.weighting);
        println!("edges: {}", path.edges.len());
        for (lat, lon) in path.points(&graph) {
            println!("{lat:.6},{lon:.6}");
        }
    }
    Ok(())
}

fn info_cmd(config: &GraphConfig) -> Result<()> {
    let graph = load_graph(config)?;
    println!("nodes: {}", graph.node_count());
    println!("edges: {}", graph.edge_count());
    println!("bounds: {}", graph.bounds());
    Ok(())
}

fn load_graph(config: &GraphConfig) -> Result<GraphStorage> {
    let location = config.graph_location()?;
    GraphStorage::load(&location)
        .with_context(|| format!("failed to load graph {}", location.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_route() {
        let cli = Cli::parse_from([
            "butterfly-edgeroute",
            "route",
            "--from",
            "43.7384,7.4246",
            "--to",
            "43.7311,7.4197",
            "--weighting",
            "shortest",
            "--graph",
            "monaco-gh.bin",
        ]);
        assert_eq!(cli.graph, Some(PathBuf::from("monaco-gh.bin")));
        match cli.command {
            Command::Route {
                from, weighting, ..
            } => {
                assert_eq!(from, (43.7384, 7.4246));
                assert_eq!(weighting, Some(Weighting::Shortest));
            }
            _ => panic!("Expected route command"),
        }
    }

    #[test]
    fn test_cli_parses_import() {
        let cli = Cli::parse_from([
            "butterfly-edgeroute",
            "import",
            "monaco.osm.pbf",
            "--vehicle",
            "bike",
            "--force",
        ]);
        match cli.command {
            Command::Import {
                osm,
                vehicle,
                force,
                sort,
                ..
            } => {
                assert_eq!(osm, Some(PathBuf::from("monaco.osm.pbf")));
                assert_eq!(vehicle, Some(Vehicle::Bike));
                assert!(force);
                assert!(!sort);
            }
            _ => panic!("Expected import command"),
        }
    }

    #[test]
    fn test_source_format_follows_extension() {
        assert!(is_pbf(FsPath::new("monaco-latest.osm.pbf")));
        assert!(!is_pbf(FsPath::new("monaco.osm")));
        assert!(!is_pbf(FsPath::new("monaco.osm.gz")));
    }

    #[test]
    fn test_import_without_source_fails() {
        let err = import(&GraphConfig::default(), false, true).unwrap_err();
        assert!(err.to_string().contains("no OSM file"));
    }
}
