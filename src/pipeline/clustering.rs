//! Collapse near-duplicate reports into representative points.
//!
//! Vessels at berth or at anchor keep reporting positions a few meters
//! apart. Left alone those reports become zero-length legs in every track,
//! so each run of reports within the cluster threshold of its predecessor is
//! reduced to a single point at the mean position.

use super::runs::split_runs;
use crate::geo_utils::centroid;
use crate::{AisPoint, ClusteredPoint, GeoPoint};

/// Cluster one vessel's time-ordered reports.
///
/// `trace` must be sorted by timestamp and belong to a single vessel. A
/// single report yields a single clustered point; an empty trace yields none.
pub fn cluster_trace(trace: &[AisPoint], threshold_m: f64) -> Vec<ClusteredPoint> {
    split_runs(trace, threshold_m, AisPoint::position)
        .filter_map(collapse_cluster)
        .collect()
}

/// Reduce one run of reports to its representative point.
fn collapse_cluster(members: &[AisPoint]) -> Option<ClusteredPoint> {
    let first = members.first()?;
    let positions: Vec<GeoPoint> = members.iter().map(AisPoint::position).collect();
    let centroid = centroid(&positions)?;
    let timestamp = members.iter().map(|p| p.timestamp).min()?;
    let vessel_name = members.iter().find_map(|p| p.vessel_name.clone());

    Some(ClusteredPoint {
        vessel_id: first.vessel_id.clone(),
        timestamp,
        vessel_name,
        centroid,
        member_count: members.len(),
    })
}
