//! Tests for CSV input

use aistrack::io::parse_timestamp;
use aistrack::{read_points, read_ports, TrackError};
use chrono::{TimeZone, Utc};

const AIS_CSV: &str = "\
MMSI,BaseDateTime,LAT,LON,SOG,VesselName
367000001,2022-01-01T00:00:00,33.70,-118.20,0.1,PACIFIC DAWN
367000001,2022-01-01T00:01:00,33.7005,-118.20,8.2,
367000002,2022-01-01 00:00:30,29.73,-95.02,0.0,
";

#[test]
fn test_read_points() {
    let batch = read_points(AIS_CSV.as_bytes()).unwrap();

    assert!(batch.rejections.is_empty());
    assert_eq!(batch.points.len(), 3);

    let first = &batch.points[0];
    assert_eq!(first.vessel_id, "367000001");
    assert_eq!(
        first.timestamp,
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(first.latitude, 33.70);
    assert_eq!(first.longitude, -118.20);
    assert_eq!(first.vessel_name.as_deref(), Some("PACIFIC DAWN"));

    // Blank names become None
    assert!(batch.points[1].vessel_name.is_none());
    assert!(batch.points[2].vessel_name.is_none());
    assert_eq!(
        batch.points[2].timestamp,
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 30).unwrap()
    );
}

#[test]
fn test_read_points_without_name_column() {
    let csv = "MMSI,BaseDateTime,LAT,LON\n538006104,2022-06-01T12:00:00Z,51.95,4.05\n";
    let batch = read_points(csv.as_bytes()).unwrap();
    assert_eq!(batch.points.len(), 1);
    assert!(batch.points[0].vessel_name.is_none());
}

#[test]
fn test_malformed_rows_are_collected() {
    let csv = "\
MMSI,BaseDateTime,LAT,LON,VesselName
367000001,2022-01-01T00:00:00,33.70,-118.20,A
367000001,yesterday,33.70,-118.20,A
367000001,2022-01-01T00:02:00,north,-118.20,A
367000001,2022-01-01T00:03:00,33.71,-118.20,A
";
    let batch = read_points(csv.as_bytes()).unwrap();

    assert_eq!(batch.points.len(), 2);
    assert_eq!(batch.rejections.len(), 2);
    assert!(matches!(
        batch.rejections[0],
        TrackError::MalformedRecord { line: 3, .. }
    ));
    assert!(matches!(
        batch.rejections[1],
        TrackError::MalformedRecord { line: 4, .. }
    ));
    assert!(batch.rejections[0].to_string().contains("yesterday"));
}

#[test]
fn test_out_of_range_points_pass_the_reader() {
    // Range checks happen in the pipeline, not the reader
    let csv = "MMSI,BaseDateTime,LAT,LON\n1,2022-01-01T00:00:00,91.0,0.0\n";
    let batch = read_points(csv.as_bytes()).unwrap();
    assert_eq!(batch.points.len(), 1);
    assert!(batch.points[0].validate(0).is_err());
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2022, 1, 1, 8, 30, 0).unwrap();
    assert_eq!(parse_timestamp("2022-01-01T08:30:00"), Some(expected));
    assert_eq!(parse_timestamp("2022-01-01 08:30:00"), Some(expected));
    assert_eq!(parse_timestamp("2022-01-01T08:30:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2022-01-01T10:30:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp(" 2022-01-01T08:30:00.000 "), Some(expected));
    assert_eq!(parse_timestamp("01/01/2022"), None);
}

const PORTS_CSV: &str = "\
RANK,NAME,STATE,TONNAGE,LAT,LON
1,Port of South Louisiana,LA,\"238,585,604\",30.05,-90.50
2,Port of Houston,TX,\"285,009,000\",29.73,-95.02
";

#[test]
fn test_read_ports() {
    let ports = read_ports(PORTS_CSV.as_bytes()).unwrap();

    assert_eq!(ports.len(), 2);
    assert_eq!(ports[0].rank, 1);
    assert_eq!(ports[0].name, "Port of South Louisiana");
    assert_eq!(ports[0].tonnage, 238_585_604);
    assert_eq!(ports[1].state, "TX");
    assert_eq!(ports[1].latitude, 29.73);
    assert_eq!(ports[1].longitude, -95.02);
}

#[test]
fn test_bad_tonnage_fails_read() {
    let csv = "RANK,NAME,STATE,TONNAGE,LAT,LON\n1,Somewhere,XX,lots,10.0,10.0\n";
    let err = read_ports(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, TrackError::InvalidPort { line: 2, .. }));
}

#[test]
fn test_bad_port_coordinates_fail_read() {
    let csv = "RANK,NAME,STATE,TONNAGE,LAT,LON\n1,Nowhere,XX,100,10.0,200.0\n";
    let err = read_ports(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, TrackError::InvalidPort { .. }));
    assert!(err.is_record_error());
}
