//! Tests for run grouping and report clustering

use aistrack::geo_utils::{distance, offset_meters};
use aistrack::{cluster_trace, run_ids, split_runs, AisPoint, GeoPoint};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
}

/// Reports for one vessel at the given positions, one minute apart.
fn trace(positions: &[GeoPoint]) -> Vec<AisPoint> {
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let time = t0() + Duration::minutes(i as i64);
            AisPoint::new("367000001", time, p.latitude, p.longitude)
        })
        .collect()
}

#[test]
fn test_split_runs_empty() {
    let points: Vec<GeoPoint> = Vec::new();
    assert_eq!(split_runs(&points, 10.0, |p| *p).count(), 0);
    assert!(run_ids(&points, 10.0, |p| *p).is_empty());
}

#[test]
fn test_split_runs_matches_run_ids() {
    let origin = GeoPoint::new(33.70, -118.20);
    let positions = vec![
        origin,
        offset_meters(&origin, 2.0, 0.0),
        offset_meters(&origin, 200.0, 0.0),
        offset_meters(&origin, 203.0, 0.0),
        offset_meters(&origin, 206.0, 0.0),
        offset_meters(&origin, 900.0, 0.0),
    ];

    let runs: Vec<&[GeoPoint]> = split_runs(&positions, 10.0, |p| *p).collect();
    assert_eq!(runs.iter().map(|r| r.len()).collect::<Vec<_>>(), vec![2, 3, 1]);
    assert_eq!(run_ids(&positions, 10.0, |p| *p), vec![0, 0, 1, 1, 1, 2]);
}

#[test]
fn test_gap_exactly_at_threshold_is_not_a_gap() {
    let a = GeoPoint::new(29.73, -95.02);
    let b = GeoPoint::new(29.7301, -95.02);
    let d = distance(&a, &b);
    let positions = [a, b];

    assert_eq!(run_ids(&positions, d, |p| *p), vec![0, 0]);
    assert_eq!(run_ids(&positions, d * (1.0 - 1e-9), |p| *p), vec![0, 1]);
}

#[test]
fn test_cluster_empty_trace() {
    assert!(cluster_trace(&[], 10.0).is_empty());
}

#[test]
fn test_cluster_single_report() {
    let points = trace(&[GeoPoint::new(33.70, -118.20)]);
    let clusters = cluster_trace(&points, 10.0);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].member_count, 1);
    assert_eq!(clusters[0].centroid, GeoPoint::new(33.70, -118.20));
    assert_eq!(clusters[0].timestamp, t0());
}

#[test]
fn test_cluster_collapses_dwell() {
    let origin = GeoPoint::new(33.70, -118.20);
    let positions = vec![
        origin,
        offset_meters(&origin, 3.0, 0.0),
        offset_meters(&origin, 6.0, 0.0),
        offset_meters(&origin, 50.0, 0.0),
    ];
    let clusters = cluster_trace(&trace(&positions), 10.0);

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].member_count, 3);
    assert_eq!(clusters[1].member_count, 1);

    // Centroid is the arithmetic mean of the three dwell reports
    let expected_lat =
        (positions[0].latitude + positions[1].latitude + positions[2].latitude) / 3.0;
    assert!((clusters[0].centroid.latitude - expected_lat).abs() < 1e-12);
    assert!((clusters[0].centroid.longitude - origin.longitude).abs() < 1e-12);

    // Earliest member timestamp represents the cluster
    assert_eq!(clusters[0].timestamp, t0());
    assert_eq!(clusters[1].timestamp, t0() + Duration::minutes(3));
}

#[test]
fn test_cluster_chains_small_steps() {
    // Each step is under the threshold even though the run spans 40 m
    let origin = GeoPoint::new(51.95, 4.05);
    let positions: Vec<GeoPoint> = (0..5)
        .map(|i| offset_meters(&origin, i as f64 * 8.0, 0.0))
        .collect();
    let clusters = cluster_trace(&trace(&positions), 10.0);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].member_count, 5);
}

#[test]
fn test_cluster_name_is_first_non_null() {
    let origin = GeoPoint::new(33.70, -118.20);
    let mut points = trace(&[
        origin,
        offset_meters(&origin, 2.0, 0.0),
        offset_meters(&origin, 4.0, 0.0),
    ]);
    points[1].vessel_name = Some("EVER GIVEN".to_string());
    points[2].vessel_name = Some("OTHER".to_string());

    let clusters = cluster_trace(&points, 10.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].vessel_name.as_deref(), Some("EVER GIVEN"));
}

#[test]
fn test_cluster_without_names() {
    let points = trace(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.00001)]);
    let clusters = cluster_trace(&points, 10.0);
    assert_eq!(clusters.len(), 1);
    assert!(clusters[0].vessel_name.is_none());
}

#[test]
fn test_cluster_order_follows_trace() {
    let origin = GeoPoint::new(0.0, 0.0);
    let positions: Vec<GeoPoint> = (0..4)
        .map(|i| offset_meters(&origin, 0.0, i as f64 * 100.0))
        .collect();
    let clusters = cluster_trace(&trace(&positions), 10.0);

    assert_eq!(clusters.len(), 4);
    assert!(clusters.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(clusters.iter().all(|c| c.member_count == 1));
}
