//! # GeoPhoto Route
//!
//! Chronological route simplification for geotagged survey photographs.
//!
//! This library provides:
//! - Geodesic (ellipsoidal) distance between photo locations
//! - Radius-based route simplification that keeps the trip's start and end
//! - Per-segment and cumulative distance metrics
//! - KML, GeoJSON and CSV export of the simplified route
//! - Optional road snapping through an OSRM-compatible service
//!
//! ## Features
//!
//! - **`parallel`** - Parallel metadata intake with rayon
//! - **`http`** - OSRM road snapper (reqwest + tokio)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use geophoto_route::{process_batch, FilterConfig, GeoPoint};
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let points = vec![
//!     GeoPoint::new("IMG_0001.jpg", -15.7939, -47.8828, t0),
//!     GeoPoint::new("IMG_0002.jpg", -15.79395, -47.8828, t0 + chrono::Duration::seconds(30)),
//!     GeoPoint::new("IMG_0003.jpg", -15.7990, -47.8828, t0 + chrono::Duration::seconds(90)),
//! ];
//!
//! let batch = process_batch(points, &FilterConfig::default()).unwrap();
//! assert_eq!(batch.route.len(), 2);
//! println!("{} km", batch.route.total_distance_km());
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, RouteError};

// Geodesic distance between photo locations
pub mod distance;
pub use distance::{geodesic_distance, DistanceEngine, GeodesicEngine};

// Radius-based simplification
pub mod simplify;
pub use simplify::{simplify, simplify_with};

// Segment and cumulative distance annotation
pub mod metrics;
pub use metrics::{annotate, annotate_with, RouteSummary};

// Decimal and sexagesimal coordinate strings
pub mod notation;
pub use notation::{decimal_notation, dms_notation, dms_to_decimal};

// Photo metadata intake
pub mod intake;
pub use intake::{
    collect_observations, read_observations_csv, MetadataReader, ObservationBatch,
    ObservationRecord, PhotoMetadata, SkipReason, SkippedInput,
};
#[cfg(feature = "parallel")]
pub use intake::collect_observations_parallel;

// Road snapping boundary
pub mod snap;
pub use snap::{snap_or_fallback, snap_or_fallback_within, RoadSnapper, SnapConfig, SnapOutcome};

// OSRM road snapper
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::OsrmSnapper;

// KML / GeoJSON / CSV writers
pub mod export;
pub use export::{to_geojson, write_kml, write_report_csv, KmlOptions};

// Configuration loading
pub mod config;
pub use config::PipelineConfig;

// End-to-end batch processing
pub mod pipeline;
pub use pipeline::{
    process_batch, process_batch_with_config, process_batch_with_snapper, ProcessedBatch,
    SharedSnapper,
};

// Algorithm toolbox - flat access to the pure functions
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// Largest minimum spacing accepted by [`FilterConfig::validate`], in meters.
pub const MAX_RADIUS_M: f64 = 5000.0;

/// One accepted photo observation.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use geophoto_route::GeoPoint;
///
/// let ts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let point = GeoPoint::new("IMG_0001.jpg", 51.5074, -0.1278, ts);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Originating photo (usually the file name)
    pub source_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Capture time, as recorded by the camera (no zone)
    pub timestamp: NaiveDateTime,
}

impl GeoPoint {
    /// Create a point without range checks.
    pub fn new(
        source_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Create a point, rejecting coordinates outside the valid ranges.
    pub fn try_new(
        source_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Self> {
        let point = Self::new(source_id, latitude, longitude, timestamp);
        point.check()?;
        Ok(point)
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RouteError::InvalidCoordinate {
                source_id: self.source_id.clone(),
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// True when both points sit on exactly the same coordinates.
    pub fn same_location(&self, other: &GeoPoint) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// Decimal coordinate string, used as the placemark name.
    pub fn coord_name(&self) -> String {
        decimal_notation(self.latitude, self.longitude)
    }

    /// Degrees/minutes/seconds coordinate string.
    pub fn dms_name(&self) -> String {
        dms_notation(self.latitude, self.longitude)
    }
}

/// Minimum-spacing filter settings, supplied once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Points closer than this to the last kept point are discarded (meters).
    /// Default: 10.0
    pub min_radius_m: f64,

    /// Always finish the route on the chronologically last photo.
    /// Default: true
    pub enforce_last_point: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_radius_m: 10.0,
            enforce_last_point: true,
        }
    }
}

impl FilterConfig {
    pub fn new(min_radius_m: f64, enforce_last_point: bool) -> Self {
        Self {
            min_radius_m,
            enforce_last_point,
        }
    }

    /// Reject radii that are negative, non-finite or above [`MAX_RADIUS_M`].
    pub fn validate(&self) -> Result<()> {
        if !self.min_radius_m.is_finite()
            || self.min_radius_m < 0.0
            || self.min_radius_m > MAX_RADIUS_M
        {
            return Err(RouteError::InvalidConfig {
                message: format!(
                    "min_radius_m must be within 0..={}, got {}",
                    MAX_RADIUS_M, self.min_radius_m
                ),
            });
        }
        Ok(())
    }
}

/// A kept point together with its distance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub point: GeoPoint,
    /// Distance to the previous kept point in meters, 2 decimals (0 for the first)
    pub segment_distance_m: f64,
    /// Running total in kilometers, 3 decimals
    pub cumulative_distance_km: f64,
    /// Appended by the mandatory-endpoint policy despite being inside the radius
    pub forced: bool,
}

/// Ordered, annotated result of simplifying one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedRoute {
    pub points: Vec<RoutePoint>,
}

impl SimplifiedRoute {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&RoutePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&RoutePoint> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoutePoint> {
        self.points.iter()
    }

    /// Cumulative distance at the final point.
    pub fn total_distance_km(&self) -> f64 {
        self.last().map_or(0.0, |p| p.cumulative_distance_km)
    }

    /// Flat `(latitude, longitude)` list, the road snapper's input.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.point.latitude, p.point.longitude))
            .collect()
    }

    /// The kept points without metrics.
    pub fn geo_points(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|p| p.point.clone()).collect()
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut iter = points.into_iter().peekable();
        iter.peek()?;

        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in iter {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center of the bounds as `(latitude, longitude)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
