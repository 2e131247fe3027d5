//! Photo metadata intake.
//!
//! Turns what a metadata reader extracted from each photo (GPS tags in
//! degrees/minutes/seconds, capture time string, file modification time)
//! into [`GeoPoint`]s. Photos without usable location or time are reported
//! as skipped; they never fail the batch.
//!
//! Reading the image container itself is left to a [`MetadataReader`]
//! implementation.

use std::fmt;
use std::io::Read;

use chrono::{DateTime, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::notation::Dms;
use crate::GeoPoint;

/// Capture time layout used by EXIF `DateTimeOriginal`.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// GPS tags as stored in photo metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsTags {
    pub latitude: Dms,
    /// `N` or `S`
    pub latitude_ref: char,
    pub longitude: Dms,
    /// `E` or `W`
    pub longitude_ref: char,
}

impl GpsTags {
    /// Signed decimal `(latitude, longitude)`.
    pub fn to_decimal(&self) -> (f64, f64) {
        (
            self.latitude.to_decimal(self.latitude_ref),
            self.longitude.to_decimal(self.longitude_ref),
        )
    }
}

/// Everything the route needs from one photo's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub file_name: String,
    /// None when the photo carries no location
    pub gps: Option<GpsTags>,
    /// Raw `DateTimeOriginal` string, e.g. `2024:05:02 09:14:07`
    pub datetime_original: Option<String>,
    /// File modification time (seconds since epoch), used when no capture time exists
    pub modified_unix: Option<i64>,
}

impl PhotoMetadata {
    /// Resolve into a point, or the reason the photo cannot be placed.
    pub fn into_point(self) -> std::result::Result<GeoPoint, SkipReason> {
        let gps = self.gps.ok_or(SkipReason::NoGpsData)?;
        let (latitude, longitude) = gps.to_decimal();

        let timestamp = match (&self.datetime_original, self.modified_unix) {
            (Some(raw), _) => parse_exif_datetime(raw)
                .map_err(|_| SkipReason::InvalidTimestamp(raw.clone()))?,
            (None, Some(secs)) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| SkipReason::InvalidTimestamp(secs.to_string()))?,
            (None, None) => return Err(SkipReason::NoTimestamp),
        };

        GeoPoint::try_new(self.file_name, latitude, longitude, timestamp)
            .map_err(|_| SkipReason::InvalidCoordinate)
    }
}

/// Parse an EXIF capture time (`YYYY:MM:DD HH:MM:SS`).
pub fn parse_exif_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), EXIF_DATETIME_FORMAT).map_err(|_| {
        RouteError::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Parse a timestamp in EXIF layout, ISO 8601 (`T` or space separated) or RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(ts) = parse_exif_datetime(trimmed) {
        return Ok(ts);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc())
        .map_err(|_| RouteError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Why a photo was left out of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    NoGpsData,
    NoTimestamp,
    InvalidTimestamp(String),
    InvalidCoordinate,
    ReadFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoGpsData => write!(f, "no GPS data"),
            SkipReason::NoTimestamp => write!(f, "no capture or modification time"),
            SkipReason::InvalidTimestamp(value) => write!(f, "invalid timestamp '{}'", value),
            SkipReason::InvalidCoordinate => write!(f, "coordinates out of range"),
            SkipReason::ReadFailed(message) => write!(f, "read failed: {}", message),
        }
    }
}

/// A photo that did not make it into the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInput {
    pub source_id: String,
    pub reason: SkipReason,
}

/// Accepted points (in input order) plus the skipped inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub points: Vec<GeoPoint>,
    pub skipped: Vec<SkippedInput>,
}

impl ObservationBatch {
    fn push(&mut self, source_id: String, outcome: std::result::Result<GeoPoint, SkipReason>) {
        match outcome {
            Ok(point) => self.points.push(point),
            Err(reason) => {
                debug!("[Intake] Skipping '{}': {}", source_id, reason);
                self.skipped.push(SkippedInput { source_id, reason });
            }
        }
    }
}

/// Reads photo metadata from some input handle (path, upload, byte buffer).
pub trait MetadataReader {
    type Input;

    /// Identifier reported when the input is skipped.
    fn source_id(&self, input: &Self::Input) -> String;

    fn read(&self, input: &Self::Input) -> Result<PhotoMetadata>;
}

fn resolve<R: MetadataReader + ?Sized>(
    reader: &R,
    input: &R::Input,
) -> (String, std::result::Result<GeoPoint, SkipReason>) {
    let source_id = reader.source_id(input);
    let outcome = reader
        .read(input)
        .map_err(|e| SkipReason::ReadFailed(e.to_string()))
        .and_then(PhotoMetadata::into_point);
    (source_id, outcome)
}

/// Read every input and sort the results into accepted and skipped.
pub fn collect_observations<R: MetadataReader + ?Sized>(
    inputs: &[R::Input],
    reader: &R,
) -> ObservationBatch {
    let mut batch = ObservationBatch::default();
    for input in inputs {
        let (source_id, outcome) = resolve(reader, input);
        batch.push(source_id, outcome);
    }

    info!(
        "[Intake] Accepted {} of {} photos ({} skipped)",
        batch.points.len(),
        inputs.len(),
        batch.skipped.len()
    );
    batch
}

/// Parallel version of [`collect_observations`].
///
/// Results come back in input order; the simplifier sorts by timestamp
/// regardless.
#[cfg(feature = "parallel")]
pub fn collect_observations_parallel<R>(inputs: &[R::Input], reader: &R) -> ObservationBatch
where
    R: MetadataReader + Sync + ?Sized,
    R::Input: Sync,
{
    use rayon::prelude::*;

    let resolved: Vec<_> = inputs.par_iter().map(|input| resolve(reader, input)).collect();

    let mut batch = ObservationBatch::default();
    for (source_id, outcome) in resolved {
        batch.push(source_id, outcome);
    }

    info!(
        "[Intake] Accepted {} of {} photos in parallel ({} skipped)",
        batch.points.len(),
        inputs.len(),
        batch.skipped.len()
    );
    batch
}

/// One row of an already-extracted observation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub source_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: Option<String>,
}

impl ObservationRecord {
    fn into_point(self) -> (String, std::result::Result<GeoPoint, SkipReason>) {
        let outcome = match (self.latitude, self.longitude, &self.timestamp) {
            (Some(lat), Some(lon), Some(raw)) => match parse_timestamp(raw) {
                Ok(ts) => GeoPoint::try_new(self.source_id.clone(), lat, lon, ts)
                    .map_err(|_| SkipReason::InvalidCoordinate),
                Err(_) => Err(SkipReason::InvalidTimestamp(raw.clone())),
            },
            (Some(_), Some(_), None) => Err(SkipReason::NoTimestamp),
            _ => Err(SkipReason::NoGpsData),
        };
        (self.source_id, outcome)
    }
}

/// Read `source_id,latitude,longitude,timestamp` rows from CSV.
///
/// Rows missing either coordinate or the timestamp are skipped, not errors.
/// Malformed CSV is an error.
pub fn read_observations_csv<R: Read>(reader: R) -> Result<ObservationBatch> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut batch = ObservationBatch::default();
    let mut rows = 0usize;
    for record in csv_reader.deserialize::<ObservationRecord>() {
        let record = record?;
        rows += 1;
        let (source_id, outcome) = record.into_point();
        batch.push(source_id, outcome);
    }

    info!(
        "[Intake] Read {} rows from CSV: {} accepted, {} skipped",
        rows,
        batch.points.len(),
        batch.skipped.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::collections::HashMap;

    fn tags(lat: (f64, f64, f64), lat_ref: char, lon: (f64, f64, f64), lon_ref: char) -> GpsTags {
        GpsTags {
            latitude: Dms::new(lat.0, lat.1, lat.2),
            latitude_ref: lat_ref,
            longitude: Dms::new(lon.0, lon.1, lon.2),
            longitude_ref: lon_ref,
        }
    }

    fn metadata(name: &str) -> PhotoMetadata {
        PhotoMetadata {
            file_name: name.to_string(),
            gps: Some(tags((15.0, 47.0, 38.04), 'S', (47.0, 52.0, 58.08), 'W')),
            datetime_original: Some("2024:05:02 09:14:07".to_string()),
            modified_unix: None,
        }
    }

    struct MapReader(HashMap<String, Result<PhotoMetadata>>);

    impl MapReader {
        fn new(entries: Vec<(&str, Result<PhotoMetadata>)>) -> Self {
            Self(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
        }
    }

    impl MetadataReader for MapReader {
        type Input = String;

        fn source_id(&self, input: &String) -> String {
            input.clone()
        }

        fn read(&self, input: &String) -> Result<PhotoMetadata> {
            match self.0.get(input) {
                Some(Ok(meta)) => Ok(meta.clone()),
                Some(Err(e)) => Err(RouteError::InvalidConfig {
                    message: e.to_string(),
                }),
                None => Err(RouteError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "missing",
                ))),
            }
        }
    }

    #[test]
    fn test_parse_exif_datetime() {
        let ts = parse_exif_datetime("2024:05:02 09:14:07").unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2024, 5, 2)
                .unwrap()
                .and_hms_opt(9, 14, 7)
                .unwrap()
        );
        assert!(matches!(
            parse_exif_datetime("2024-05-02"),
            Err(RouteError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = parse_exif_datetime("2024:05:02 09:14:07").unwrap();
        assert_eq!(parse_timestamp("2024-05-02T09:14:07").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-02 09:14:07").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-02T09:14:07Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-02T11:14:07+02:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_metadata_into_point() {
        let point = metadata("IMG_1.jpg").into_point().unwrap();
        assert_eq!(point.source_id, "IMG_1.jpg");
        assert!((point.latitude + 15.7939).abs() < 1e-9);
        assert!((point.longitude + 47.8828).abs() < 1e-9);
        assert_eq!(point.timestamp.hour(), 9);
    }

    #[test]
    fn test_metadata_falls_back_to_modified_time() {
        let mut meta = metadata("IMG_2.jpg");
        meta.datetime_original = None;
        meta.modified_unix = Some(1_714_641_247); // 2024-05-02 09:14:07 UTC
        let point = meta.into_point().unwrap();
        assert_eq!(point.timestamp, parse_exif_datetime("2024:05:02 09:14:07").unwrap());
    }

    #[test]
    fn test_metadata_skip_reasons() {
        let mut no_gps = metadata("a.jpg");
        no_gps.gps = None;
        assert_eq!(no_gps.into_point().unwrap_err(), SkipReason::NoGpsData);

        let mut no_time = metadata("b.jpg");
        no_time.datetime_original = None;
        assert_eq!(no_time.into_point().unwrap_err(), SkipReason::NoTimestamp);

        let mut bad_time = metadata("c.jpg");
        bad_time.datetime_original = Some("0000:00:00 00:00:00".to_string());
        assert!(matches!(
            bad_time.into_point().unwrap_err(),
            SkipReason::InvalidTimestamp(_)
        ));

        let mut bad_coord = metadata("d.jpg");
        bad_coord.gps = Some(tags((95.0, 0.0, 0.0), 'N', (10.0, 0.0, 0.0), 'E'));
        assert_eq!(bad_coord.into_point().unwrap_err(), SkipReason::InvalidCoordinate);
    }

    #[test]
    fn test_collect_observations_reports_skips() {
        let mut no_gps = metadata("no_gps.jpg");
        no_gps.gps = None;
        let reader = MapReader::new(vec![
            ("IMG_1.jpg", Ok(metadata("IMG_1.jpg"))),
            ("no_gps.jpg", Ok(no_gps)),
            ("IMG_3.jpg", Ok(metadata("IMG_3.jpg"))),
        ]);
        let inputs: Vec<String> = ["IMG_1.jpg", "no_gps.jpg", "broken.jpg", "IMG_3.jpg"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let batch = collect_observations(&inputs, &reader);
        let ids: Vec<_> = batch.points.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, ["IMG_1.jpg", "IMG_3.jpg"]);
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(batch.skipped[0].source_id, "no_gps.jpg");
        assert_eq!(batch.skipped[0].reason, SkipReason::NoGpsData);
        assert_eq!(batch.skipped[1].source_id, "broken.jpg");
        assert!(matches!(batch.skipped[1].reason, SkipReason::ReadFailed(_)));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let names: Vec<String> = (0..64).map(|i| format!("IMG_{:04}.jpg", i)).collect();
        let reader = MapReader::new(
            names
                .iter()
                .map(|n| (n.as_str(), Ok(metadata(n))))
                .collect(),
        );
        let sequential = collect_observations(&names, &reader);
        let parallel = collect_observations_parallel(&names, &reader);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_read_observations_csv() {
        let data = "\
source_id,latitude,longitude,timestamp
IMG_1.jpg,-15.7939,-47.8828,2024-05-02T09:14:07
IMG_2.jpg,,,2024-05-02T09:15:00
IMG_3.jpg,-15.7950,-47.8830,
IMG_4.jpg,123.0,-47.8830,2024-05-02T09:16:00
IMG_5.jpg, -15.7960 , -47.8840 ,2024:05:02 09:17:00
";
        let batch = read_observations_csv(data.as_bytes()).unwrap();
        let ids: Vec<_> = batch.points.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, ["IMG_1.jpg", "IMG_5.jpg"]);
        let reasons: Vec<_> = batch.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            [
                SkipReason::NoGpsData,
                SkipReason::NoTimestamp,
                SkipReason::InvalidCoordinate
            ]
        );
    }
}
