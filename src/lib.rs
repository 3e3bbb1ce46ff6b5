//! # AIS Track Builder
//!
//! Derives vessel tracks from AIS position reports.
//!
//! This library provides:
//! - Clustering of near-duplicate stationary reports into representative points
//! - Gap-based segmentation of each vessel's clustered reports into tracks
//! - Minimum-point filtering of degenerate tracks
//! - Port proximity filtering backed by an R-tree over port coordinates
//! - Report-level counts of AIS positions near ports
//! - CSV readers for AIS reports and port tables, GeoJSON output
//! - Parallel per-vessel processing
//!
//! ## Features
//!
//! - **`parallel`** - Process vessels in parallel with rayon (default)
//! - **`cli`** - Build the `aistrack-cli` binary (default)
//! - **`synthetic`** - Synthetic AIS fleet generator for benchmarks and stress tests
//!
//! ## Quick Start
//!
//! ```rust
//! use aistrack::{AisPoint, TrackConfig, TrackPipeline};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let t0 = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
//! let points: Vec<AisPoint> = (0..5)
//!     .map(|i| {
//!         AisPoint::new("366970320", t0 + Duration::minutes(i), 33.70 + i as f64 * 0.0005, -118.20)
//!     })
//!     .collect();
//!
//! let pipeline = TrackPipeline::new(TrackConfig::default()).unwrap();
//! let result = pipeline.build_tracks(points);
//!
//! assert_eq!(result.tracks.len(), 1);
//! assert_eq!(result.tracks[0].geometry.len(), 5);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackError};

// Geographic utilities (distance, centroid, buffer tests, bounds)
pub mod geo_utils;

// Clustering, segmentation and track building
pub mod pipeline;
pub use pipeline::{
    build_track, build_tracks, cluster_trace, run_ids, segment_clusters, split_runs,
    AtomicProgressTracker, NoopProgress, PipelinePhase, PipelineStats, ProgressCallback,
    ProximityCounts, TrackPipeline, TrackSet, VesselTrace,
};

// Port reference data and proximity filtering
pub mod ports;
pub use ports::{parse_tonnage, ports_by_tonnage, PortIndex};

// CSV input boundary
pub mod io;
pub use io::{read_points, read_points_csv, read_ports, read_ports_csv, PointBatch};

// GeoJSON output
pub mod geojson;

// Synthetic AIS fleets for benchmarks and stress tests
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in WGS84 degrees.
///
/// # Example
/// ```
/// use aistrack::GeoPoint;
/// let point = GeoPoint::new(33.755, -118.215); // Port of Long Beach
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points. Returns `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }
}

/// A single AIS position report.
///
/// `vessel_id` is the MMSI. Reports are immutable once created; the pipeline
/// only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AisPoint {
    pub vessel_id: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vessel_name: Option<String>,
}

impl AisPoint {
    /// Create a report without a vessel name.
    pub fn new(
        vessel_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            vessel_id: vessel_id.into(),
            timestamp,
            latitude,
            longitude,
            vessel_name: None,
        }
    }

    /// Attach a vessel name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.vessel_name = Some(name.into());
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Check the report before it enters the pipeline.
    ///
    /// `record` is the report's position in the input stream and is carried
    /// into the error so the offending row can be located.
    pub fn validate(&self, record: usize) -> Result<()> {
        let reason = if self.vessel_id.trim().is_empty() {
            Some("empty vessel id".to_string())
        } else if !self.latitude.is_finite() || !self.longitude.is_finite() {
            Some(format!(
                "non-finite coordinates ({}, {})",
                self.latitude, self.longitude
            ))
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            Some(format!("latitude {} out of range", self.latitude))
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            Some(format!("longitude {} out of range", self.longitude))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TrackError::InvalidPoint {
                record,
                vessel_id: self.vessel_id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// A run of near-duplicate reports collapsed to one representative point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredPoint {
    pub vessel_id: String,
    /// Earliest timestamp in the cluster
    pub timestamp: DateTime<Utc>,
    /// First non-null vessel name in the cluster
    pub vessel_name: Option<String>,
    /// Arithmetic mean of the member coordinates
    pub centroid: GeoPoint,
    /// Number of raw reports collapsed into this point
    pub member_count: usize,
}

/// A contiguous run of clustered points with no internal gap above the
/// segmentation threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub vessel_id: String,
    /// Per-vessel index, starting at 0 and incremented at every gap
    pub segment_id: u32,
    pub points: Vec<ClusteredPoint>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One continuous leg of vessel movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub vessel_id: String,
    pub vessel_name: Option<String>,
    pub segment_id: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Polyline in ascending timestamp order
    pub geometry: Vec<GeoPoint>,
}

impl Track {
    pub fn point_count(&self) -> usize {
        self.geometry.len()
    }

    /// Great-circle length of the polyline in meters.
    pub fn length_meters(&self) -> f64 {
        geo_utils::path_length(&self.geometry)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.geometry)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// A port from the static reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub rank: u32,
    pub name: String,
    pub state: String,
    /// Annual tonnage, normalized from formatted strings like `"1,234,567"`
    pub tonnage: u64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Port {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Half-open time interval `[start, end)` used to pre-filter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.start <= *timestamp && *timestamp < self.end
    }
}

/// Configuration for the track pipeline.
///
/// All distances are meters on the WGS84 spheroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Consecutive reports farther apart than this start a new cluster.
    /// Default: 10.0 meters
    pub cluster_gap_threshold_m: f64,

    /// Consecutive clustered points farther apart than this start a new segment.
    /// Default: 100.0 meters
    pub segment_gap_threshold_m: f64,

    /// Segments with fewer clustered points than this are discarded.
    /// Default: 3
    pub min_points_per_track: usize,

    /// Buffer radius around each port for the proximity filter.
    /// Default: 500.0 meters
    pub proximity_buffer_m: f64,

    /// Only reports inside this window are processed. `None` keeps everything.
    pub time_window: Option<TimeWindow>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            cluster_gap_threshold_m: 10.0,
            segment_gap_threshold_m: 100.0,
            min_points_per_track: 3,
            proximity_buffer_m: 500.0,
            time_window: None,
        }
    }
}

impl TrackConfig {
    /// Reject configurations that cannot produce meaningful tracks.
    pub fn validate(&self) -> Result<()> {
        check_positive("cluster_gap_threshold_m", self.cluster_gap_threshold_m)?;
        check_positive("segment_gap_threshold_m", self.segment_gap_threshold_m)?;
        check_positive("proximity_buffer_m", self.proximity_buffer_m)?;

        if self.min_points_per_track < 1 {
            return Err(TrackError::config(
                "min_points_per_track",
                "must be at least 1",
            ));
        }

        if let Some(window) = &self.time_window {
            if window.start >= window.end {
                return Err(TrackError::config(
                    "time_window",
                    format!("start {} is not before end {}", window.start, window.end),
                ));
            }
        }

        Ok(())
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrackError::config(
            field,
            format!("must be a positive distance, got {value}"),
        ))
    }
}
