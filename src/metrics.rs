//! Segment and cumulative distance metrics over a simplified route.
//!
//! Values are rounded when computed (segments to centimeters, running
//! totals to meters expressed in kilometers) and the rounded values are
//! what exporters write.

use serde::{Deserialize, Serialize};

use crate::distance::{DistanceEngine, GeodesicEngine};
use crate::{Bounds, GeoPoint, RoutePoint, SimplifiedRoute};

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Annotate an ordered route with geodesic segment metrics.
pub fn annotate(route: &[GeoPoint]) -> SimplifiedRoute {
    annotate_with(&GeodesicEngine, route)
}

/// Annotate an ordered route using the given distance engine.
///
/// Index 0 gets zero for both metrics. Every later entry gets the distance
/// to its predecessor (2 decimals) and the running total of those rounded
/// segments in kilometers (3 decimals).
pub fn annotate_with<E: DistanceEngine + ?Sized>(engine: &E, route: &[GeoPoint]) -> SimplifiedRoute {
    let mut total_m = 0.0;
    let mut previous: Option<&GeoPoint> = None;

    let points = route
        .iter()
        .map(|point| {
            let segment_distance_m = match previous {
                Some(prev) => round_to(engine.distance(prev, point), 2),
                None => 0.0,
            };
            total_m += segment_distance_m;
            previous = Some(point);

            RoutePoint {
                point: point.clone(),
                segment_distance_m,
                cumulative_distance_km: round_to(total_m / 1000.0, 3),
                forced: false,
            }
        })
        .collect();

    SimplifiedRoute { points }
}

/// Batch-level figures shown next to the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Points accepted into the batch before simplification
    pub original_count: usize,
    /// Points in the simplified route
    pub kept_count: usize,
    /// Share of points removed, 0-100
    pub reduction_percent: f64,
    pub total_distance_km: f64,
    /// Mean `(latitude, longitude)` of kept points, used to center map views
    pub center: Option<(f64, f64)>,
    pub bounds: Option<Bounds>,
}

impl RouteSummary {
    pub fn new(original_count: usize, route: &SimplifiedRoute) -> Self {
        let kept_count = route.len();
        let reduction_percent = if original_count == 0 {
            0.0
        } else {
            100.0 - (kept_count as f64 / original_count as f64 * 100.0)
        };

        let center = if route.is_empty() {
            None
        } else {
            let n = kept_count as f64;
            let (lat_sum, lng_sum) = route.iter().fold((0.0, 0.0), |(lat, lng), p| {
                (lat + p.point.latitude, lng + p.point.longitude)
            });
            Some((lat_sum / n, lng_sum / n))
        };

        Self {
            original_count,
            kept_count,
            reduction_percent,
            total_distance_km: route.total_distance_km(),
            center,
            bounds: Bounds::from_points(route.iter().map(|p| &p.point)),
        }
    }

    /// One-line description, e.g. `Original: 120 points | Simplified: 30 points (75.0% reduction)`.
    pub fn describe(&self) -> String {
        format!(
            "Original: {} points | Simplified: {} points ({:.1}% reduction)",
            self.original_count, self.kept_count, self.reduction_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(id: &str, lat: f64, lon: f64) -> GeoPoint {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        GeoPoint::new(id, lat, lon, ts)
    }

    struct FixedEngine(f64);

    impl DistanceEngine for FixedEngine {
        fn distance(&self, _a: &GeoPoint, _b: &GeoPoint) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(0.0004, 3), 0.0);
    }

    #[test]
    fn test_annotate_empty() {
        assert!(annotate(&[]).is_empty());
    }

    #[test]
    fn test_annotate_single_point() {
        let route = annotate(&[point("a", 10.0, 10.0)]);
        assert_eq!(route.len(), 1);
        assert_eq!(route.points[0].segment_distance_m, 0.0);
        assert_eq!(route.points[0].cumulative_distance_km, 0.0);
    }

    #[test]
    fn test_annotate_rounds_segments_and_totals() {
        let pts = vec![point("a", 0.0, 0.0), point("b", 0.0, 0.0), point("c", 0.0, 0.0)];
        let route = annotate_with(&FixedEngine(123.4567), &pts);
        assert_eq!(route.points[1].segment_distance_m, 123.46);
        assert_eq!(route.points[1].cumulative_distance_km, 0.123);
        assert_eq!(route.points[2].segment_distance_m, 123.46);
        assert_eq!(route.points[2].cumulative_distance_km, 0.247);
        assert_eq!(route.total_distance_km(), 0.247);
    }

    #[test]
    fn test_cumulative_is_monotonic() {
        let pts: Vec<GeoPoint> = (0..20)
            .map(|i| point(&format!("p{}", i), (i as f64 * 0.0007).sin() * 0.01, i as f64 * 0.0003))
            .collect();
        let route = annotate(&pts);
        for w in route.points.windows(2) {
            assert!(w[1].cumulative_distance_km >= w[0].cumulative_distance_km);
        }
    }

    #[test]
    fn test_summary() {
        let pts = vec![point("a", 0.0, 0.0), point("b", 0.02, 0.04)];
        let route = annotate(&pts);
        let summary = RouteSummary::new(8, &route);
        assert_eq!(summary.kept_count, 2);
        assert_eq!(summary.reduction_percent, 75.0);
        let (lat, lng) = summary.center.unwrap();
        assert!((lat - 0.01).abs() < 1e-12);
        assert!((lng - 0.02).abs() < 1e-12);
        assert_eq!(summary.bounds.unwrap().max_lng, 0.04);
        assert_eq!(
            summary.describe(),
            "Original: 8 points | Simplified: 2 points (75.0% reduction)"
        );
    }

    #[test]
    fn test_summary_empty() {
        let summary = RouteSummary::new(0, &SimplifiedRoute::default());
        assert_eq!(summary.reduction_percent, 0.0);
        assert!(summary.center.is_none());
        assert!(summary.bounds.is_none());
    }
}
