//! CSV input boundary for AIS reports and port tables.
//!
//! Malformed AIS rows are collected as rejections and never abort a read.
//! The port table is small reference data, so any bad port row fails the
//! whole read.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{info, warn};
use serde::Deserialize;

use crate::ports::parse_tonnage;
use crate::{AisPoint, GeoPoint, Port, Result, TrackError};

/// Naive timestamp layouts accepted after RFC 3339; interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Reports read from a CSV source plus the rows that could not be parsed.
#[derive(Debug, Default)]
pub struct PointBatch {
    pub points: Vec<AisPoint>,
    pub rejections: Vec<TrackError>,
}

/// One AIS row, MarineCadastre column names. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawAisRecord {
    #[serde(rename = "MMSI")]
    mmsi: String,
    #[serde(rename = "BaseDateTime")]
    base_date_time: String,
    #[serde(rename = "LAT")]
    lat: String,
    #[serde(rename = "LON")]
    lon: String,
    #[serde(rename = "VesselName", default)]
    vessel_name: Option<String>,
}

impl RawAisRecord {
    fn into_point(self) -> std::result::Result<AisPoint, String> {
        let timestamp = parse_timestamp(&self.base_date_time)
            .ok_or_else(|| format!("unparseable timestamp '{}'", self.base_date_time))?;
        let latitude = parse_coordinate("latitude", &self.lat)?;
        let longitude = parse_coordinate("longitude", &self.lon)?;

        Ok(AisPoint {
            vessel_id: self.mmsi,
            timestamp,
            latitude,
            longitude,
            vessel_name: self.vessel_name.filter(|name| !name.trim().is_empty()),
        })
    }
}

/// One row of the port table: `RANK,NAME,STATE,TONNAGE,LAT,LON`.
#[derive(Debug, Deserialize)]
struct RawPortRecord {
    #[serde(rename = "RANK")]
    rank: u32,
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "STATE")]
    state: String,
    #[serde(rename = "TONNAGE")]
    tonnage: String,
    #[serde(rename = "LAT")]
    lat: f64,
    #[serde(rename = "LON")]
    lon: f64,
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` one
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_coordinate(field: &str, raw: &str) -> std::result::Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("non-numeric {} '{}'", field, raw))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Read AIS reports from CSV with a header row.
///
/// Only I/O failures are returned as errors; rows that fail to parse end up
/// in [`PointBatch::rejections`].
pub fn read_points<R: Read>(reader: R) -> Result<PointBatch> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut batch = PointBatch::default();

    for row in rdr.records() {
        let record = match row {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line = err.position().map_or(0, |p| p.line());
                batch.rejections.push(TrackError::MalformedRecord {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map_or(0, |p| p.line());
        let parsed = record
            .deserialize::<RawAisRecord>(Some(&headers))
            .map_err(|err| err.to_string())
            .and_then(RawAisRecord::into_point);

        match parsed {
            Ok(point) => batch.points.push(point),
            Err(reason) => batch
                .rejections
                .push(TrackError::MalformedRecord { line, reason }),
        }
    }

    if !batch.rejections.is_empty() {
        warn!("[Input] {} malformed AIS rows skipped", batch.rejections.len());
    }
    info!("[Input] Read {} AIS reports", batch.points.len());

    Ok(batch)
}

/// Read AIS reports from a CSV file.
pub fn read_points_csv(path: impl AsRef<Path>) -> Result<PointBatch> {
    let file = File::open(path.as_ref())?;
    read_points(BufReader::new(file))
}

/// Read the port table from CSV with a header row.
///
/// Tonnage figures are normalized to integers. Fails on the first row that
/// cannot be parsed or carries invalid coordinates.
pub fn read_ports<R: Read>(reader: R) -> Result<Vec<Port>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut ports = Vec::new();

    for row in rdr.records() {
        let record = row?;
        let line = record.position().map_or(0, |p| p.line());
        let raw: RawPortRecord = record
            .deserialize(Some(&headers))
            .map_err(|err| TrackError::InvalidPort {
                line,
                reason: err.to_string(),
            })?;

        let tonnage = parse_tonnage(&raw.tonnage).ok_or_else(|| TrackError::InvalidPort {
            line,
            reason: format!("unparseable tonnage '{}'", raw.tonnage),
        })?;

        if !GeoPoint::new(raw.lat, raw.lon).is_valid() {
            return Err(TrackError::InvalidPort {
                line,
                reason: format!("coordinates ({}, {}) out of range", raw.lat, raw.lon),
            });
        }

        ports.push(Port {
            rank: raw.rank,
            name: raw.name,
            state: raw.state,
            tonnage,
            latitude: raw.lat,
            longitude: raw.lon,
        });
    }

    info!("[Input] Read {} ports", ports.len());
    Ok(ports)
}

/// Read the port table from a CSV file.
pub fn read_ports_csv(path: impl AsRef<Path>) -> Result<Vec<Port>> {
    let file = File::open(path.as_ref())?;
    read_ports(BufReader::new(file))
}
