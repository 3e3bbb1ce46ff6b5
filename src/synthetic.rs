//! Synthetic AIS fleet generator for stress testing and benchmarking.
//!
//! Each vessel dwells at a port (emitting near-duplicate reports), sails a
//! leg away from it, goes silent while it jumps far enough to force a
//! segment break, and repeats. The number of tracks per vessel is therefore
//! known in advance and serves as ground truth.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use aistrack::synthetic::SyntheticFleet;
//! use aistrack::{TrackConfig, TrackPipeline};
//!
//! let fleet = SyntheticFleet {
//!     vessel_count: 4,
//!     legs_per_vessel: 3,
//!     ..SyntheticFleet::default()
//! };
//! let dataset = fleet.generate();
//!
//! let pipeline = TrackPipeline::new(TrackConfig::default()).unwrap();
//! let result = pipeline.build_tracks(dataset.points);
//! assert_eq!(result.tracks.len(), dataset.expected_tracks);
//! ```

use std::f64::consts::PI;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::offset_meters;
use crate::{AisPoint, GeoPoint, Port};

// ============================================================================
// Types
// ============================================================================

/// Scenario configuration for a synthetic fleet.
#[derive(Debug, Clone)]
pub struct SyntheticFleet {
    /// Center of the operating area.
    pub origin: GeoPoint,
    /// Number of vessels.
    pub vessel_count: usize,
    /// Legs per vessel; each leg becomes one track.
    pub legs_per_vessel: usize,
    /// Moving reports per leg.
    pub reports_per_leg: usize,
    /// Distance between consecutive moving reports in meters.
    pub report_spacing_m: f64,
    /// Stationary reports at the start of each leg.
    pub dwell_reports: usize,
    /// Position jitter of stationary reports in meters.
    pub dwell_jitter_m: f64,
    /// Jump between legs in meters, well above the segment threshold.
    pub leg_gap_m: f64,
    /// Seconds between reports of one vessel.
    pub report_interval_secs: i64,
    /// First report time.
    pub start: DateTime<Utc>,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SyntheticFleet {
    fn default() -> Self {
        Self {
            origin: GeoPoint::new(33.74, -118.23),
            vessel_count: 10,
            legs_per_vessel: 3,
            reports_per_leg: 40,
            report_spacing_m: 60.0,
            dwell_reports: 8,
            dwell_jitter_m: 1.0,
            leg_gap_m: 5_000.0,
            report_interval_secs: 30,
            start: Utc.timestamp_opt(1_640_995_200, 0).single().unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Metadata about a generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    /// Total reports across all vessels.
    pub total_points: usize,
    /// Stationary reports that should collapse during clustering.
    pub dwell_points: usize,
}

/// A complete synthetic dataset with ground truth.
pub struct SyntheticDataset {
    /// Reports of all vessels, interleaved by timestamp.
    pub points: Vec<AisPoint>,
    /// One port at the dwell position of every leg.
    pub ports: Vec<Port>,
    /// Tracks the default pipeline configuration should produce.
    pub expected_tracks: usize,
    pub metadata: DatasetMetadata,
}

// ============================================================================
// Generation
// ============================================================================

/// Leg of straight-ish motion starting at `start` with the given heading.
fn generate_leg(
    start: &GeoPoint,
    heading: f64,
    count: usize,
    spacing_m: f64,
    rng: &mut StdRng,
) -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(count);
    let mut heading = heading;
    let mut current = *start;

    for _ in 0..count {
        heading += rng.gen_range(-0.05..0.05);
        current = offset_meters(
            &current,
            spacing_m * heading.sin(),
            spacing_m * heading.cos(),
        );
        points.push(current);
    }

    points
}

/// Gaussian jitter around a point (Box-Muller).
fn jitter(center: &GeoPoint, sigma_m: f64, rng: &mut StdRng) -> GeoPoint {
    if sigma_m <= 0.0 {
        return *center;
    }
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.gen();
    let radius = (-2.0 * u1.ln()).sqrt() * sigma_m;
    let z0 = radius * (2.0 * PI * u2).cos();
    let z1 = radius * (2.0 * PI * u2).sin();
    offset_meters(center, z0, z1)
}

impl SyntheticFleet {
    /// Generate the dataset described by this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut points = Vec::new();
        let mut ports = Vec::new();
        let mut dwell_points = 0;

        for vessel_idx in 0..self.vessel_count {
            let vessel_id = format!("3669{:05}", vessel_idx);
            let vessel_name = format!("SYNTH VESSEL {}", vessel_idx);

            // Spread vessels on a ring around the origin.
            let bearing = 2.0 * PI * vessel_idx as f64 / self.vessel_count.max(1) as f64;
            let mut anchor = offset_meters(
                &self.origin,
                20_000.0 * bearing.sin(),
                20_000.0 * bearing.cos(),
            );
            let offset_secs = rng.gen_range(0..self.report_interval_secs.max(1));
            let mut time = self.start + Duration::seconds(offset_secs);

            for leg in 0..self.legs_per_vessel {
                ports.push(Port {
                    rank: ports.len() as u32 + 1,
                    name: format!("Synthetic Port {}-{}", vessel_idx, leg),
                    state: "XX".to_string(),
                    tonnage: rng.gen_range(100_000..50_000_000),
                    latitude: anchor.latitude,
                    longitude: anchor.longitude,
                });

                for _ in 0..self.dwell_reports {
                    let position = jitter(&anchor, self.dwell_jitter_m, &mut rng);
                    points.push(
                        AisPoint::new(&vessel_id, time, position.latitude, position.longitude)
                            .with_name(&vessel_name),
                    );
                    time += Duration::seconds(self.report_interval_secs);
                    dwell_points += 1;
                }

                let heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                let leg_points = generate_leg(
                    &anchor,
                    heading,
                    self.reports_per_leg,
                    self.report_spacing_m,
                    &mut rng,
                );
                for position in &leg_points {
                    points.push(
                        AisPoint::new(&vessel_id, time, position.latitude, position.longitude)
                            .with_name(&vessel_name),
                    );
                    time += Duration::seconds(self.report_interval_secs);
                }

                // AIS silence: the next leg starts far from where this one ended.
                let end = leg_points.last().copied().unwrap_or(anchor);
                anchor = offset_meters(
                    &end,
                    self.leg_gap_m * heading.sin(),
                    self.leg_gap_m * heading.cos(),
                );
                time += Duration::seconds(self.report_interval_secs * 20);
            }
        }

        points.sort_by_key(|p| p.timestamp);

        SyntheticDataset {
            metadata: DatasetMetadata {
                total_points: points.len(),
                dwell_points,
            },
            expected_tracks: self.vessel_count * self.legs_per_vessel,
            points,
            ports,
        }
    }
}
