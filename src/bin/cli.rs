//! aistrack CLI - derive vessel tracks from AIS CSV exports
//!
//! Usage:
//!   aistrack-cli tracks <points.csv> [--output <file>] [pipeline options]
//!   aistrack-cli port-tracks <points.csv> --ports <ports.csv> [--output <file>] [pipeline options]
//!   aistrack-cli clusters <points.csv> [--output <file>] [pipeline options]
//!   aistrack-cli near-port <points.csv> --ports <ports.csv> [--port <name>] [pipeline options]
//!   aistrack-cli ports <ports.csv> [--output <file>]
//!
//! Output is GeoJSON, written to the given file or to stdout.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aistrack::geojson::{cluster_feature, port_feature, track_feature, Feature, FeatureCollection};
use aistrack::io::parse_timestamp;
use aistrack::{
    ports_by_tonnage, read_points_csv, read_ports_csv, run_ids, AtomicProgressTracker,
    PortIndex, TimeWindow, TrackConfig, TrackError, TrackPipeline, TrackSet,
};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "aistrack-cli")]
#[command(about = "Derive vessel tracks from AIS position reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build tracks from AIS reports
    Tracks {
        /// CSV file with AIS reports (MMSI, BaseDateTime, LAT, LON, VesselName)
        points: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build tracks and keep those passing near a port
    PortTracks {
        /// CSV file with AIS reports
        points: PathBuf,

        /// CSV file with ports (RANK, NAME, STATE, TONNAGE, LAT, LON)
        #[arg(long)]
        ports: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export clustered report positions
    Clusters {
        /// CSV file with AIS reports
        points: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Count reports within the proximity buffer of each port
    NearPort {
        /// CSV file with AIS reports
        points: PathBuf,

        /// CSV file with ports
        #[arg(long)]
        ports: PathBuf,

        /// Only count reports near the port with this name
        #[arg(long)]
        port: Option<String>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export the port table, largest tonnage first
    Ports {
        /// CSV file with ports
        ports: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// JSON file with a full pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cluster gap threshold in meters
    #[arg(long)]
    cluster_gap: Option<f64>,

    /// Segment gap threshold in meters
    #[arg(long)]
    segment_gap: Option<f64>,

    /// Minimum clustered points per track
    #[arg(long)]
    min_points: Option<usize>,

    /// Port proximity buffer in meters
    #[arg(long)]
    buffer: Option<f64>,

    /// Start of the time window (inclusive), e.g. 2022-01-01T00:00:00
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// End of the time window (exclusive)
    #[arg(long, requires = "start")]
    end: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output GeoJSON file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of features to write
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> aistrack::Result<()> {
    match command {
        Commands::Tracks {
            points,
            pipeline,
            output,
        } => {
            let pipeline = TrackPipeline::new(pipeline.resolve()?)?;
            let batch = read_points_csv(&points)?;
            let result = pipeline.build_tracks(batch.points);
            report(&result, batch.rejections.len());

            let features = result.tracks.iter().map(track_feature).collect();
            write_features(features, &output)
        }
        Commands::PortTracks {
            points,
            ports,
            pipeline,
            output,
        } => {
            let pipeline = TrackPipeline::new(pipeline.resolve()?)?;
            let index = PortIndex::new(read_ports_csv(&ports)?);
            let batch = read_points_csv(&points)?;

            let progress = AtomicProgressTracker::new();
            let result = pipeline.build_port_tracks(batch.points, &index, &progress)?;
            report(&result, batch.rejections.len());

            let radius = pipeline.config().proximity_buffer_m;
            let features = result
                .tracks
                .iter()
                .map(|track| {
                    let mut feature = track_feature(track);
                    if let Some((port, dist)) = index.nearest_within(&track.geometry, radius) {
                        feature.set_property("nearest_port", port.name.clone());
                        feature.set_property("nearest_port_distance_m", dist.round());
                    }
                    feature
                })
                .collect();
            write_features(features, &output)
        }
        Commands::Clusters {
            points,
            pipeline,
            output,
        } => {
            let pipeline = TrackPipeline::new(pipeline.resolve()?)?;
            let batch = read_points_csv(&points)?;
            let clusters = pipeline.cluster_points(batch.points);
            info!("Clustered into {} points", clusters.len());

            // Clusters arrive grouped by vessel; label each with its segment.
            let threshold = pipeline.config().segment_gap_threshold_m;
            let features = clusters
                .chunk_by(|a, b| a.vessel_id == b.vessel_id)
                .flat_map(|vessel| {
                    let ids = run_ids(vessel, threshold, |c| c.centroid);
                    vessel.iter().zip(ids).map(|(cluster, segment_id)| {
                        let mut feature = cluster_feature(cluster);
                        feature.set_property("segment_id", segment_id);
                        feature
                    })
                })
                .collect();
            write_features(features, &output)
        }
        Commands::NearPort {
            points,
            ports,
            port,
            pipeline,
            output,
        } => {
            let pipeline = TrackPipeline::new(pipeline.resolve()?)?;
            let mut ports = read_ports_csv(&ports)?;
            if let Some(name) = &port {
                ports.retain(|p| p.name.eq_ignore_ascii_case(name));
                if ports.is_empty() {
                    return Err(TrackError::config(
                        "port",
                        format!("no port named '{}'", name),
                    ));
                }
            }
            let index = PortIndex::new(ports);
            let batch = read_points_csv(&points)?;

            let counts = pipeline.count_reports_near_ports(batch.points, &index);
            info!(
                "{} of {} reports within {} m of a port",
                counts.near_any,
                counts.reports,
                pipeline.config().proximity_buffer_m
            );

            let features = index
                .ports()
                .iter()
                .zip(&counts.per_port)
                .filter(|(_, count)| **count > 0)
                .map(|(port, count)| {
                    let mut feature = port_feature(port);
                    feature.set_property("report_count", *count);
                    feature
                })
                .collect();
            write_features(features, &output)
        }
        Commands::Ports { ports, output } => {
            let ports = read_ports_csv(&ports)?;
            if let Some(largest) = ports_by_tonnage(&ports).first() {
                info!(
                    "Largest port: {} ({}), {} tons",
                    largest.name, largest.state, largest.tonnage
                );
            }
            let features = ports_by_tonnage(&ports)
                .into_iter()
                .map(port_feature)
                .collect();
            write_features(features, &output)
        }
    }
}

impl PipelineArgs {
    /// Merge the optional config file with command-line overrides.
    fn resolve(&self) -> aistrack::Result<TrackConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => TrackConfig::default(),
        };

        if let Some(value) = self.cluster_gap {
            config.cluster_gap_threshold_m = value;
        }
        if let Some(value) = self.segment_gap {
            config.segment_gap_threshold_m = value;
        }
        if let Some(value) = self.min_points {
            config.min_points_per_track = value;
        }
        if let Some(value) = self.buffer {
            config.proximity_buffer_m = value;
        }
        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            config.time_window = Some(TimeWindow::new(
                parse_window_bound("start", start)?,
                parse_window_bound("end", end)?,
            ));
        }

        Ok(config)
    }
}

fn load_config(path: &Path) -> aistrack::Result<TrackConfig> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_window_bound(
    field: &'static str,
    raw: &str,
) -> aistrack::Result<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(raw)
        .ok_or_else(|| TrackError::config(field, format!("unparseable timestamp '{}'", raw)))
}

fn report(result: &TrackSet, malformed_rows: usize) {
    let stats = &result.stats;
    info!(
        "{} reports, {} vessels, {} clustered points, {} segments, {} tracks",
        stats.input_points, stats.vessels, stats.clustered_points, stats.segments, stats.tracks
    );
    if stats.port_filtered > 0 {
        info!("{} tracks removed by the port filter", stats.port_filtered);
    }
    let rejected = malformed_rows + stats.rejected_points;
    if rejected > 0 {
        warn!(
            "{} records rejected ({} malformed rows, {} invalid reports)",
            rejected, malformed_rows, stats.rejected_points
        );
    }
}

fn write_features(mut features: Vec<Feature>, output: &OutputArgs) -> aistrack::Result<()> {
    if let Some(limit) = output.limit {
        if features.len() > limit {
            info!("Writing first {} of {} features", limit, features.len());
            features.truncate(limit);
        }
    }
    let collection = FeatureCollection::new(features);

    match &output.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            collection.write_to(&mut writer)?;
            writer.flush()?;
            info!(
                "Wrote {} features to {}",
                collection.features.len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            collection.write_to(&mut writer)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}
