//! GeoJSON serialization of tracks, clustered points and ports.
//!
//! Coordinates are written `[longitude, latitude]` per RFC 7946. Track
//! features carry `MMSI` and `VesselName` properties so existing map popups
//! keyed on those names keep working.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ClusteredPoint, GeoPoint, Port, Result, Track};

/// GeoJSON geometry subset produced by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl Geometry {
    pub fn point(p: &GeoPoint) -> Self {
        Geometry::Point {
            coordinates: lon_lat(p),
        }
    }

    pub fn line_string(points: &[GeoPoint]) -> Self {
        Geometry::LineString {
            coordinates: points.iter().map(lon_lat).collect(),
        }
    }
}

fn lon_lat(p: &GeoPoint) -> [f64; 2] {
    [p.longitude, p.latitude]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties,
        }
    }

    /// Add or replace a property.
    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Write as pretty-printed JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

/// A track as a LineString feature.
pub fn track_feature(track: &Track) -> Feature {
    let mut properties = Map::new();
    properties.insert("MMSI".into(), Value::String(track.vessel_id.clone()));
    properties.insert("VesselName".into(), optional_string(&track.vessel_name));
    properties.insert("segment_id".into(), track.segment_id.into());
    properties.insert("start_time".into(), track.start_time.to_rfc3339().into());
    properties.insert("end_time".into(), track.end_time.to_rfc3339().into());
    properties.insert("point_count".into(), track.point_count().into());
    properties.insert(
        "length_m".into(),
        Value::from((track.length_meters() * 10.0).round() / 10.0),
    );

    Feature::new(Geometry::line_string(&track.geometry), properties)
}

/// A clustered point as a Point feature.
pub fn cluster_feature(point: &ClusteredPoint) -> Feature {
    let mut properties = Map::new();
    properties.insert("MMSI".into(), Value::String(point.vessel_id.clone()));
    properties.insert("VesselName".into(), optional_string(&point.vessel_name));
    properties.insert("time".into(), point.timestamp.to_rfc3339().into());
    properties.insert("member_count".into(), point.member_count.into());

    Feature::new(Geometry::point(&point.centroid), properties)
}

/// A port as a Point feature.
pub fn port_feature(port: &Port) -> Feature {
    let mut properties = Map::new();
    properties.insert("rank".into(), port.rank.into());
    properties.insert("name".into(), Value::String(port.name.clone()));
    properties.insert("state".into(), Value::String(port.state.clone()));
    properties.insert("tonnage".into(), port.tonnage.into());

    Feature::new(Geometry::point(&port.position()), properties)
}

/// Tracks as a FeatureCollection, in input order.
pub fn track_feature_collection(tracks: &[Track]) -> FeatureCollection {
    FeatureCollection::new(tracks.iter().map(track_feature).collect())
}
