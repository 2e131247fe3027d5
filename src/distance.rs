//! Geodesic distance between photo locations.
//!
//! Distances are measured on the WGS84 ellipsoid (Karney's algorithm via
//! `geo`), not with a flat-Earth or spherical approximation.

use geo::{Distance, Geodesic, Point};

use crate::GeoPoint;

/// Source of point-to-point distances for simplification and metrics.
///
/// Implementations must be deterministic and symmetric, and return
/// exactly 0 for identical coordinates.
pub trait DistanceEngine {
    /// Distance between two points in meters.
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64;
}

/// WGS84 ellipsoidal distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicEngine;

impl DistanceEngine for GeodesicEngine {
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        geodesic_distance(a, b)
    }
}

/// Geodesic distance between two points in meters.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use geophoto_route::{geodesic_distance, GeoPoint};
///
/// let ts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let london = GeoPoint::new("a", 51.5074, -0.1278, ts);
/// let paris = GeoPoint::new("b", 48.8566, 2.3522, ts);
/// let d = geodesic_distance(&london, &paris);
/// assert!((d - 343_900.0).abs() < 2_000.0);
/// ```
pub fn geodesic_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    geodesic_distance_coords((a.latitude, a.longitude), (b.latitude, b.longitude))
}

/// Geodesic distance between two `(latitude, longitude)` pairs in meters.
pub fn geodesic_distance_coords(a: (f64, f64), b: (f64, f64)) -> f64 {
    if a == b {
        return 0.0;
    }

    // Always solve in the same argument order so d(a, b) == d(b, a) bit for bit
    let (first, second) = if (a.0, a.1) <= (b.0, b.1) { (a, b) } else { (b, a) };

    let d = Geodesic::distance(
        Point::new(first.1, first.0),
        Point::new(second.1, second.0),
    );
    d.max(0.0)
}

/// Total length of a path through the given points, in meters.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| geodesic_distance(&w[0], &w[1]))
        .sum()
}
