//! Radius-based route simplification.
//!
//! Photos are put in capture order, then a single forward pass keeps a
//! photo only if it lies at least `min_radius_m` from the last photo that
//! was kept. The first photo is always kept; with `enforce_last_point` the
//! last photo closes the route even when it falls inside the radius.

use log::{debug, info};

use crate::distance::{DistanceEngine, GeodesicEngine};
use crate::error::{OptionExt, Result};
use crate::metrics::annotate_with;
use crate::{FilterConfig, GeoPoint, SimplifiedRoute};

/// Simplify a batch using geodesic distances.
///
/// Fails with [`RouteError::EmptyInput`](crate::RouteError::EmptyInput) on an
/// empty batch, and with `InvalidCoordinate` / `InvalidConfig` on bad input.
/// Nothing is clamped.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use geophoto_route::{simplify, FilterConfig, GeoPoint};
///
/// let t = |s| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, s).unwrap();
/// let points = vec![
///     GeoPoint::new("b.jpg", 0.0010, 0.0, t(10)),
///     GeoPoint::new("a.jpg", 0.0000, 0.0, t(0)),
///     GeoPoint::new("c.jpg", 0.0011, 0.0, t(20)),
/// ];
///
/// let route = simplify(points, &FilterConfig::new(50.0, false)).unwrap();
/// let ids: Vec<_> = route.iter().map(|p| p.point.source_id.as_str()).collect();
/// assert_eq!(ids, ["a.jpg", "b.jpg"]);
/// ```
pub fn simplify(points: Vec<GeoPoint>, config: &FilterConfig) -> Result<SimplifiedRoute> {
    simplify_with(&GeodesicEngine, points, config)
}

/// Simplify a batch with a caller-supplied distance engine.
pub fn simplify_with<E: DistanceEngine + ?Sized>(
    engine: &E,
    mut points: Vec<GeoPoint>,
    config: &FilterConfig,
) -> Result<SimplifiedRoute> {
    config.validate()?;
    for p in &points {
        p.check()?;
    }

    let original_count = points.len();

    // Stable: equal timestamps keep upload order
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let (kept, last_forced) = filter_sorted(engine, points, config)?;

    debug!(
        "[RouteSimplifier] radius={}m enforce_last={} kept {}/{} points",
        config.min_radius_m,
        config.enforce_last_point,
        kept.len(),
        original_count
    );

    let mut route = annotate_with(engine, &kept);
    if last_forced {
        if let Some(last) = route.points.last_mut() {
            last.forced = true;
            info!(
                "[RouteSimplifier] Final point '{}' kept by endpoint policy ({:.2}m from previous)",
                last.point.source_id, last.segment_distance_m
            );
        }
    }

    Ok(route)
}

/// Fold over chronologically sorted points.
///
/// Returns the kept points and whether the final one was appended only
/// because of the endpoint policy.
fn filter_sorted<E: DistanceEngine + ?Sized>(
    engine: &E,
    sorted: Vec<GeoPoint>,
    config: &FilterConfig,
) -> Result<(Vec<GeoPoint>, bool)> {
    let mut iter = sorted.into_iter();
    let first = iter.next().ok_or_empty_input()?;

    let mut rest: Vec<GeoPoint> = iter.collect();
    let forced_tail = if config.enforce_last_point {
        rest.pop()
    } else {
        None
    };

    let mut kept = rest.into_iter().fold(vec![first], |mut kept, candidate| {
        let last_kept = &kept[kept.len() - 1];
        if engine.distance(last_kept, &candidate) >= config.min_radius_m {
            kept.push(candidate);
        }
        kept
    });

    // The tail is never part of the scan, so it cannot already be in `kept`
    let mut last_forced = false;
    if let Some(tail) = forced_tail {
        let last_kept = &kept[kept.len() - 1];
        last_forced = engine.distance(last_kept, &tail) < config.min_radius_m;
        kept.push(tail);
    }

    Ok((kept, last_forced))
}
