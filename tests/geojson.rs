//! Tests for GeoJSON output

use aistrack::geojson::{
    cluster_feature, port_feature, track_feature, track_feature_collection, Geometry,
};
use aistrack::{ClusteredPoint, GeoPoint, Port, Track};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

fn sample_track() -> Track {
    let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    Track {
        vessel_id: "367000001".to_string(),
        vessel_name: Some("PACIFIC DAWN".to_string()),
        segment_id: 2,
        start_time: start,
        end_time: start + Duration::minutes(10),
        geometry: vec![
            GeoPoint::new(33.70, -118.20),
            GeoPoint::new(33.71, -118.21),
        ],
    }
}

#[test]
fn test_track_feature() {
    let feature = track_feature(&sample_track());

    assert_eq!(feature.kind, "Feature");
    assert_eq!(
        feature.geometry,
        Geometry::LineString {
            coordinates: vec![[-118.20, 33.70], [-118.21, 33.71]]
        }
    );
    assert_eq!(feature.properties["MMSI"], json!("367000001"));
    assert_eq!(feature.properties["VesselName"], json!("PACIFIC DAWN"));
    assert_eq!(feature.properties["segment_id"], json!(2));
    assert_eq!(feature.properties["point_count"], json!(2));
    assert_eq!(
        feature.properties["start_time"],
        json!("2022-01-01T00:00:00+00:00")
    );
    assert!(feature.properties["length_m"].as_f64().unwrap() > 1_000.0);
}

#[test]
fn test_unnamed_track_has_null_name() {
    let mut track = sample_track();
    track.vessel_name = None;
    let feature = track_feature(&track);
    assert_eq!(feature.properties["VesselName"], Value::Null);
}

#[test]
fn test_cluster_and_port_features() {
    let cluster = ClusteredPoint {
        vessel_id: "1".to_string(),
        timestamp: Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        vessel_name: None,
        centroid: GeoPoint::new(10.0, 20.0),
        member_count: 4,
    };
    let feature = cluster_feature(&cluster);
    assert_eq!(
        feature.geometry,
        Geometry::Point {
            coordinates: [20.0, 10.0]
        }
    );
    assert_eq!(feature.properties["member_count"], json!(4));

    let port = Port {
        rank: 3,
        name: "Port of Long Beach".to_string(),
        state: "CA".to_string(),
        tonnage: 80_000_000,
        latitude: 33.75,
        longitude: -118.21,
    };
    let feature = port_feature(&port);
    assert_eq!(feature.properties["rank"], json!(3));
    assert_eq!(feature.properties["tonnage"], json!(80_000_000u64));
}

#[test]
fn test_feature_collection_serialization() {
    let collection = track_feature_collection(&[sample_track()]);
    let mut buf = Vec::new();
    collection.write_to(&mut buf).unwrap();

    let value: Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"][0]["type"], "Feature");
    assert_eq!(value["features"][0]["geometry"]["type"], "LineString");
    assert_eq!(
        value["features"][0]["geometry"]["coordinates"][0],
        json!([-118.20, 33.70])
    );
}
