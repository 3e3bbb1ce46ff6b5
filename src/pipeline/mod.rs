//! # Track Pipeline
//!
//! Turns a stream of AIS reports into vessel tracks.
//!
//! ## Stages
//!
//! - `runs` - Run-length grouping by distance gap, shared by the next two stages
//! - `clustering` - Collapse near-duplicate reports into centroids
//! - `segmentation` - Split clustered points at gaps above the segment threshold
//! - `tracks` - Keep segments with enough points as polylines
//!
//! Reports are validated, filtered to the configured time window and
//! partitioned by vessel. Each vessel is then processed independently (in
//! parallel with the `parallel` feature) and the per-vessel results are merged
//! in vessel id order, so a run is a pure function of its input and config.

pub mod clustering;
pub mod progress;
pub mod runs;
pub mod segmentation;
pub mod tracks;

pub use clustering::cluster_trace;
pub use progress::{AtomicProgressTracker, NoopProgress, PipelinePhase, ProgressCallback};
pub use runs::{run_ids, split_runs};
pub use segmentation::segment_clusters;
pub use tracks::{build_track, build_tracks};

use std::collections::BTreeMap;

use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::ports::PortIndex;
use crate::{AisPoint, ClusteredPoint, GeoPoint, Result, Track, TrackConfig, TrackError};

/// Rejections logged individually before switching to a summary line.
const MAX_LOGGED_REJECTIONS: usize = 20;

/// All reports of one vessel, sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTrace {
    pub vessel_id: String,
    pub points: Vec<AisPoint>,
}

impl VesselTrace {
    /// Create a trace, sorting reports by timestamp.
    ///
    /// The sort is stable, so reports with equal timestamps keep their input
    /// order.
    pub fn new(vessel_id: impl Into<String>, mut points: Vec<AisPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            vessel_id: vessel_id.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Reports received
    pub input_points: usize,
    /// Reports rejected as invalid
    pub rejected_points: usize,
    /// Valid reports outside the time window
    pub outside_window: usize,
    /// Distinct vessels processed
    pub vessels: usize,
    /// Clustered points across all vessels
    pub clustered_points: usize,
    /// Segments across all vessels
    pub segments: usize,
    /// Segments dropped for having too few points
    pub discarded_segments: usize,
    /// Tracks built
    pub tracks: usize,
    /// Tracks removed by the port proximity filter
    pub port_filtered: usize,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct TrackSet {
    /// Tracks ordered by vessel id, then segment id
    pub tracks: Vec<Track>,
    pub stats: PipelineStats,
    /// One entry per rejected report
    pub rejections: Vec<TrackError>,
}

/// Report-level port proximity counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProximityCounts {
    /// Valid reports inside the time window
    pub reports: usize,
    /// Reports within the buffer of at least one port
    pub near_any: usize,
    /// Reports within the buffer of each port, indexed like [`PortIndex::ports`]
    pub per_port: Vec<usize>,
    /// Reports rejected as invalid
    pub rejected: usize,
}

/// Per-vessel output, merged after all vessels are done.
struct VesselOutcome {
    tracks: Vec<Track>,
    clustered_points: usize,
    segments: usize,
}

/// Validated, windowed and partitioned input.
struct PreparedInput {
    partitions: Vec<(String, Vec<AisPoint>)>,
    stats: PipelineStats,
    rejections: Vec<TrackError>,
}

impl PreparedInput {
    fn finish(self, outcomes: impl IntoIterator<Item = VesselOutcome>) -> TrackSet {
        let mut stats = self.stats;
        let mut tracks = Vec::new();

        for outcome in outcomes {
            stats.clustered_points += outcome.clustered_points;
            stats.segments += outcome.segments;
            stats.discarded_segments += outcome.segments - outcome.tracks.len();
            tracks.extend(outcome.tracks);
        }
        stats.tracks = tracks.len();

        info!(
            "[Pipeline] Built {} tracks from {} reports across {} vessels ({} rejected, {} outside window, {} segments discarded)",
            stats.tracks,
            stats.input_points,
            stats.vessels,
            stats.rejected_points,
            stats.outside_window,
            stats.discarded_segments
        );

        TrackSet {
            tracks,
            stats,
            rejections: self.rejections,
        }
    }
}

/// Track pipeline bound to a validated configuration.
///
/// The pipeline holds no other state; the same instance can serve any number
/// of runs, concurrently if needed.
#[derive(Debug, Clone)]
pub struct TrackPipeline {
    config: TrackConfig,
}

impl TrackPipeline {
    /// Create a pipeline, rejecting invalid configuration before any data is seen.
    pub fn new(config: TrackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Build tracks from reports.
    ///
    /// Invalid reports are skipped and returned in [`TrackSet::rejections`];
    /// they never abort the run.
    pub fn build_tracks<I>(&self, points: I) -> TrackSet
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let mut prepared = self.prepare(points);
        let partitions = std::mem::take(&mut prepared.partitions);
        let outcomes = self.process_partitions(partitions, &NoopProgress);
        prepared.finish(outcomes.into_iter().flatten())
    }

    /// Build tracks, reporting per-vessel progress.
    ///
    /// Returns [`TrackError::Cancelled`] if the callback requests
    /// cancellation; vessels finished before that point are discarded.
    pub fn build_tracks_with_progress<I>(
        &self,
        points: I,
        progress: &dyn ProgressCallback,
    ) -> Result<TrackSet>
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let mut prepared = self.prepare(points);
        let partitions = std::mem::take(&mut prepared.partitions);
        let total = partitions.len();

        progress.on_phase(PipelinePhase::BuildingTracks, total);
        let outcomes = self.process_partitions(partitions, progress);

        if progress.is_cancelled() {
            let completed = outcomes.iter().filter(|o| o.is_some()).count();
            warn!(
                "[Pipeline] Cancelled after {} of {} vessels, discarding results",
                completed, total
            );
            return Err(TrackError::Cancelled { completed, total });
        }

        Ok(prepared.finish(outcomes.into_iter().flatten()))
    }

    /// Build tracks and keep only those passing within the proximity buffer
    /// of at least one port.
    pub fn build_port_tracks<I>(
        &self,
        points: I,
        ports: &PortIndex,
        progress: &dyn ProgressCallback,
    ) -> Result<TrackSet>
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let mut result = self.build_tracks_with_progress(points, progress)?;
        let before = result.tracks.len();

        progress.on_phase(PipelinePhase::FilteringPorts, before);
        let tracks = std::mem::take(&mut result.tracks);
        let kept = self.filter_tracks(tracks, ports, progress);

        if progress.is_cancelled() {
            return Err(TrackError::Cancelled {
                completed: result.stats.vessels,
                total: result.stats.vessels,
            });
        }

        result.stats.port_filtered = before - kept.len();
        result.stats.tracks = kept.len();
        result.tracks = kept;

        info!(
            "[Ports] {} of {} tracks pass within {} m of {} ports",
            result.stats.tracks,
            before,
            self.config.proximity_buffer_m,
            ports.len()
        );

        Ok(result)
    }

    /// Keep the tracks that pass within the configured buffer of any port.
    pub fn filter_near_ports(&self, tracks: Vec<Track>, ports: &PortIndex) -> Vec<Track> {
        self.filter_tracks(tracks, ports, &NoopProgress)
    }

    /// Count raw reports, not tracks, lying within the proximity buffer of
    /// the ports.
    ///
    /// Reports are validated and filtered to the time window first; nothing
    /// is clustered or segmented.
    pub fn count_reports_near_ports<I>(&self, points: I, ports: &PortIndex) -> ProximityCounts
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let prepared = self.prepare(points);
        let radius = self.config.proximity_buffer_m;
        let positions: Vec<GeoPoint> = prepared
            .partitions
            .iter()
            .flat_map(|(_, points)| points.iter().map(AisPoint::position))
            .collect();

        let counts = ProximityCounts {
            reports: positions.len(),
            near_any: ports.count_within(&positions, radius),
            per_port: ports.counts_per_port(&positions, radius),
            rejected: prepared.stats.rejected_points,
        };

        info!(
            "[Ports] {} of {} reports within {} m of {} ports",
            counts.near_any,
            counts.reports,
            radius,
            ports.len()
        );

        counts
    }

    /// Cluster reports without segmenting them.
    ///
    /// Clustered points are ordered by vessel id, then timestamp. Rejected
    /// reports are logged and dropped.
    pub fn cluster_points<I>(&self, points: I) -> Vec<ClusteredPoint>
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let prepared = self.prepare(points);
        let threshold = self.config.cluster_gap_threshold_m;

        #[cfg(feature = "parallel")]
        let clusters: Vec<Vec<ClusteredPoint>> = prepared
            .partitions
            .into_par_iter()
            .map(|(vessel_id, points)| {
                let trace = VesselTrace::new(vessel_id, points);
                cluster_trace(&trace.points, threshold)
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let clusters: Vec<Vec<ClusteredPoint>> = prepared
            .partitions
            .into_iter()
            .map(|(vessel_id, points)| {
                let trace = VesselTrace::new(vessel_id, points);
                cluster_trace(&trace.points, threshold)
            })
            .collect();

        clusters.into_iter().flatten().collect()
    }

    /// Cluster, segment and build tracks for a single vessel.
    pub fn process_trace(&self, trace: &VesselTrace) -> Vec<Track> {
        self.process_vessel(trace).tracks
    }

    fn process_vessel(&self, trace: &VesselTrace) -> VesselOutcome {
        let clusters = cluster_trace(&trace.points, self.config.cluster_gap_threshold_m);
        let segments = segment_clusters(&clusters, self.config.segment_gap_threshold_m);
        let tracks = build_tracks(&segments, self.config.min_points_per_track);

        debug!(
            "[Pipeline] Vessel {}: {} reports -> {} clusters -> {} segments -> {} tracks",
            trace.vessel_id,
            trace.len(),
            clusters.len(),
            segments.len(),
            tracks.len()
        );

        VesselOutcome {
            tracks,
            clustered_points: clusters.len(),
            segments: segments.len(),
        }
    }

    /// Process every partition; `None` marks a vessel skipped after cancellation.
    fn process_partitions(
        &self,
        partitions: Vec<(String, Vec<AisPoint>)>,
        progress: &dyn ProgressCallback,
    ) -> Vec<Option<VesselOutcome>> {
        let work = |(vessel_id, points): (String, Vec<AisPoint>)| {
            if progress.is_cancelled() {
                return None;
            }
            let trace = VesselTrace::new(vessel_id, points);
            let outcome = self.process_vessel(&trace);
            progress.on_progress();
            Some(outcome)
        };

        #[cfg(feature = "parallel")]
        let outcomes = partitions.into_par_iter().map(work).collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes = partitions.into_iter().map(work).collect();

        outcomes
    }

    fn filter_tracks(
        &self,
        tracks: Vec<Track>,
        ports: &PortIndex,
        progress: &dyn ProgressCallback,
    ) -> Vec<Track> {
        let radius = self.config.proximity_buffer_m;
        let keep = |track: &Track| {
            if progress.is_cancelled() {
                return false;
            }
            let near = ports.any_within(&track.geometry, radius);
            progress.on_progress();
            near
        };

        #[cfg(feature = "parallel")]
        let kept = tracks.into_par_iter().filter(keep).collect();

        #[cfg(not(feature = "parallel"))]
        let kept = tracks.into_iter().filter(keep).collect();

        kept
    }

    /// Validate, apply the time window and partition by vessel.
    fn prepare<I>(&self, points: I) -> PreparedInput
    where
        I: IntoIterator<Item = AisPoint>,
    {
        let mut stats = PipelineStats::default();
        let mut rejections = Vec::new();
        let mut by_vessel: BTreeMap<String, Vec<AisPoint>> = BTreeMap::new();

        for (record, point) in points.into_iter().enumerate() {
            stats.input_points += 1;

            if let Err(err) = point.validate(record) {
                if rejections.len() < MAX_LOGGED_REJECTIONS {
                    warn!("[Pipeline] Rejected report: {}", err);
                }
                rejections.push(err);
                continue;
            }

            if let Some(window) = &self.config.time_window {
                if !window.contains(&point.timestamp) {
                    stats.outside_window += 1;
                    continue;
                }
            }

            by_vessel
                .entry(point.vessel_id.clone())
                .or_default()
                .push(point);
        }

        stats.rejected_points = rejections.len();
        if stats.rejected_points > MAX_LOGGED_REJECTIONS {
            warn!(
                "[Pipeline] {} reports rejected in total ({} not logged individually)",
                stats.rejected_points,
                stats.rejected_points - MAX_LOGGED_REJECTIONS
            );
        }
        stats.vessels = by_vessel.len();

        PreparedInput {
            partitions: by_vessel.into_iter().collect(),
            stats,
            rejections,
        }
    }
}
