//! # Algorithm Toolbox
//!
//! Direct access to the pure route algorithms, for callers that want to
//! wire them into their own pipeline instead of using [`crate::pipeline`].
//!
//! ## Core Algorithms
//!
//! - **Simplification**: chronological radius filter with endpoint policy
//! - **Segment Metrics**: rounded per-segment and cumulative distances
//!
//! ## Geographic Utilities
//!
//! - **Geodesic Distance**: WGS84 ellipsoidal distance between points
//! - **Polyline Length**: Total distance along a path
//! - **Coordinate Notation**: decimal and D°M'S" strings
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use geophoto_route::algorithms::{geodesic_distance, dms_notation, GeoPoint};
//!
//! let ts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let a = GeoPoint::new("a", -15.7939, -47.8828, ts);
//! let b = GeoPoint::new("b", -15.8012, -47.8701, ts);
//! println!("{:.1} m", geodesic_distance(&a, &b));
//! assert_eq!(dms_notation(a.latitude, a.longitude), "15°47'38.04\"S, 47°52'58.08\"W");
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{Bounds, FilterConfig, GeoPoint, RoutePoint, SimplifiedRoute};

// =============================================================================
// Geographic Utilities
// =============================================================================

pub use crate::distance::{
    geodesic_distance, geodesic_distance_coords, polyline_length, DistanceEngine, GeodesicEngine,
};

pub use crate::notation::{
    decimal_notation, dms_latitude, dms_longitude, dms_notation, dms_to_decimal, Dms,
};

// =============================================================================
// Route Algorithms
// =============================================================================

/// Sort by capture time and drop points inside `min_radius_m` of the last
/// kept point. See [`crate::simplify::simplify`].
pub use crate::simplify::{simplify, simplify_with};

/// Per-segment (2 decimals, meters) and cumulative (3 decimals, km) distances.
pub use crate::metrics::{annotate, annotate_with, round_to, RouteSummary};
