//! Geographic utilities: distances, centroids, buffer tests and bounds.
//!
//! Threshold comparisons everywhere in the crate go through [`distance`],
//! which measures on the WGS84 spheroid rather than in planar degrees.

use geo::{Distance, Geodesic, Haversine, Point};

use crate::{Bounds, GeoPoint};

/// Meters per degree of latitude (mean, used for degree conversions only).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Expansion applied to degree-converted radii before R-tree pruning, so the
/// spherical conversion never under-covers the spheroidal distance.
const PRUNING_MARGIN: f64 = 1.1;

fn to_point(p: &GeoPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

/// Geodesic distance between two points in meters (WGS84 spheroid).
pub fn distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    Geodesic::distance(to_point(p1), to_point(p2))
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Total great-circle length of a polyline in meters.
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Arithmetic mean of the coordinates.
///
/// Not geodesic-correct: the mean drifts for widely spread points, near the
/// poles, and across the antimeridian. Clusters are bounded by a small gap
/// threshold, which keeps the error negligible for that use.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.latitude, lng + p.longitude)
    });
    Some(GeoPoint::new(lat_sum / n, lng_sum / n))
}

/// Wrap a longitude difference into [-180, 180].
fn wrap_longitude_delta(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

fn normalize_longitude(lng: f64) -> f64 {
    wrap_longitude_delta(lng)
}

/// Minimum distance in meters from `point` to the segment `start`-`end`.
///
/// The closest position along the segment is found in a local
/// equirectangular frame centred on `point`, then measured geodesically.
/// Endpoints are always measured exactly, so a degenerate segment reduces to
/// the distance to its single position.
pub fn point_segment_distance(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint) -> f64 {
    let to_start = distance(point, start);
    if start == end {
        return to_start;
    }
    let endpoint_min = to_start.min(distance(point, end));

    let cos_lat = point.latitude.to_radians().cos();
    let ax = wrap_longitude_delta(start.longitude - point.longitude) * cos_lat;
    let ay = start.latitude - point.latitude;
    let seg_dlng = wrap_longitude_delta(end.longitude - start.longitude);
    let dx = seg_dlng * cos_lat;
    let dy = end.latitude - start.latitude;

    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON * f64::EPSILON {
        return endpoint_min;
    }

    let t = -(ax * dx + ay * dy) / len_sq;
    if t <= 0.0 || t >= 1.0 {
        return endpoint_min;
    }

    let projected = GeoPoint::new(
        start.latitude + t * dy,
        normalize_longitude(start.longitude + t * seg_dlng),
    );
    endpoint_min.min(distance(point, &projected))
}

/// Minimum distance in meters from `point` to any position on `line`.
///
/// A single-point line is the distance to that point; an empty line has no
/// distance.
pub fn line_distance(line: &[GeoPoint], point: &GeoPoint) -> Option<f64> {
    match line {
        [] => None,
        [only] => Some(distance(only, point)),
        _ => Some(
            line.windows(2)
                .map(|w| point_segment_distance(point, &w[0], &w[1]))
                .fold(f64::INFINITY, f64::min),
        ),
    }
}

/// True when some position on `line` lies within `radius_m` of `point`
/// (boundary inclusive).
pub fn buffer_contains(line: &[GeoPoint], point: &GeoPoint, radius_m: f64) -> bool {
    match line {
        [] => false,
        [only] => distance(only, point) <= radius_m,
        _ => line
            .windows(2)
            .any(|w| point_segment_distance(point, &w[0], &w[1]) <= radius_m),
    }
}

/// Convert a distance in meters to degrees of longitude at a given latitude.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    meters / (METERS_PER_DEGREE * cos_lat)
}

/// Grow bounds by `meters` in every direction, conservatively.
///
/// When the grown box would cross the antimeridian, or reaches a pole, the
/// longitude range is widened to the whole globe instead of wrapping. Bounds
/// spanning more than 180 degrees of longitude are taken to come from a line
/// that crosses the antimeridian and are widened the same way.
pub fn expand_bounds(bounds: &Bounds, meters: f64) -> Bounds {
    let lat_pad = meters / METERS_PER_DEGREE * PRUNING_MARGIN;
    let min_lat = (bounds.min_lat - lat_pad).max(-90.0);
    let max_lat = (bounds.max_lat + lat_pad).min(90.0);

    let widest_lat = min_lat.abs().max(max_lat.abs());
    let lng_pad = meters_to_degrees(meters, widest_lat) * PRUNING_MARGIN;
    let min_lng = bounds.min_lng - lng_pad;
    let max_lng = bounds.max_lng + lng_pad;

    let crosses_antimeridian = bounds.max_lng - bounds.min_lng > 180.0;
    if crosses_antimeridian || min_lng < -180.0 || max_lng > 180.0 || widest_lat >= 89.0 {
        return Bounds {
            min_lat,
            max_lat,
            min_lng: -180.0,
            max_lng: 180.0,
        };
    }

    Bounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    }
}

/// Offset a point by meters north and east (flat-earth approximation,
/// adequate for the short offsets used in tests and synthetic data).
pub fn offset_meters(origin: &GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    GeoPoint::new(
        origin.latitude + north_m / METERS_PER_DEGREE,
        normalize_longitude(origin.longitude + meters_to_degrees(east_m, origin.latitude)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_longitude_delta() {
        assert_eq!(wrap_longitude_delta(350.0), -10.0);
        assert_eq!(wrap_longitude_delta(-350.0), 10.0);
        assert_eq!(wrap_longitude_delta(45.0), 45.0);
    }

    #[test]
    fn test_segment_across_antimeridian() {
        // Segment from 179.99 to -179.99 passes right over the query point.
        let p = GeoPoint::new(0.0, 180.0);
        let a = GeoPoint::new(0.0, 179.99);
        let b = GeoPoint::new(0.0, -179.99);
        assert!(point_segment_distance(&p, &a, &b) < 1.0);
    }
}
