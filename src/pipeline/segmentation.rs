//! Split clustered points into segments at distance gaps.

use super::runs::split_runs;
use crate::{ClusteredPoint, Segment};

/// Partition one vessel's clustered points into segments.
///
/// A new segment starts wherever two consecutive clustered points are more
/// than `threshold_m` apart. Segment ids count the gaps, starting from 0.
pub fn segment_clusters(clusters: &[ClusteredPoint], threshold_m: f64) -> Vec<Segment> {
    split_runs(clusters, threshold_m, |c| c.centroid)
        .enumerate()
        .filter_map(|(segment_id, run)| {
            let first = run.first()?;
            Some(Segment {
                vessel_id: first.vessel_id.clone(),
                segment_id: segment_id as u32,
                points: run.to_vec(),
            })
        })
        .collect()
}
