//! Turn segments into tracks.

use crate::{Segment, Track};

/// Build a track from a segment, or `None` when the segment holds fewer than
/// `min_points` clustered points.
///
/// The polyline keeps the segment's order exactly; nothing is reordered,
/// deduplicated or smoothed here.
pub fn build_track(segment: &Segment, min_points: usize) -> Option<Track> {
    if segment.len() < min_points {
        return None;
    }
    let first = segment.points.first()?;
    let last = segment.points.last()?;

    Some(Track {
        vessel_id: segment.vessel_id.clone(),
        vessel_name: segment.points.iter().find_map(|p| p.vessel_name.clone()),
        segment_id: segment.segment_id,
        start_time: first.timestamp,
        end_time: last.timestamp,
        geometry: segment.points.iter().map(|p| p.centroid).collect(),
    })
}

/// Build tracks from segments, dropping those below `min_points`.
pub fn build_tracks(segments: &[Segment], min_points: usize) -> Vec<Track> {
    segments
        .iter()
        .filter_map(|segment| build_track(segment, min_points))
        .collect()
}
