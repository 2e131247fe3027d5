//! Road snapping boundary.
//!
//! A [`RoadSnapper`] replaces the straight-line coordinate sequence with one
//! that follows the road network. Snapping is never allowed to fail the
//! pipeline: any error, empty answer or timeout falls back to the input
//! coordinates unchanged.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// Default bound on a snapping request.
pub const DEFAULT_SNAP_TIMEOUT_SECS: u64 = 10;

/// Remaps an ordered `(latitude, longitude)` list onto a road network.
///
/// Implementations should bound their own wait; use
/// [`snap_or_fallback_within`] for snappers that cannot.
pub trait RoadSnapper {
    fn snap(&self, coordinates: &[(f64, f64)]) -> Result<Vec<(f64, f64)>>;
}

/// Road snapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Whether the pipeline should attempt snapping at all.
    /// Default: false
    pub enabled: bool,
    /// Base URL of an OSRM-compatible routing service
    pub base_url: String,
    /// Routing profile (`driving`, `cycling`, `foot`)
    pub profile: String,
    /// Upper bound on one snapping request, in seconds.
    /// Default: 10
    pub timeout_secs: u64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: DEFAULT_SNAP_TIMEOUT_SECS,
        }
    }
}

impl SnapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Coordinates to draw, and whether they came from the snapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapOutcome {
    pub coordinates: Vec<(f64, f64)>,
    pub snapped: bool,
    /// Set when the input was used because snapping failed
    pub fallback_reason: Option<String>,
}

impl SnapOutcome {
    pub(crate) fn unchanged(coordinates: &[(f64, f64)], reason: Option<String>) -> Self {
        Self {
            coordinates: coordinates.to_vec(),
            snapped: false,
            fallback_reason: reason,
        }
    }
}

fn settle(coordinates: &[(f64, f64)], result: Result<Vec<(f64, f64)>>) -> SnapOutcome {
    match result {
        Ok(snapped) if !snapped.is_empty() => {
            info!(
                "[RoadSnapper] Snapped {} points onto {} road points",
                coordinates.len(),
                snapped.len()
            );
            SnapOutcome {
                coordinates: snapped,
                snapped: true,
                fallback_reason: None,
            }
        }
        Ok(_) => {
            warn!("[RoadSnapper] Service returned no geometry, keeping straight-line route");
            SnapOutcome::unchanged(coordinates, Some("empty response".to_string()))
        }
        Err(e) => {
            warn!("[RoadSnapper] {}, keeping straight-line route", e);
            SnapOutcome::unchanged(coordinates, Some(e.to_string()))
        }
    }
}

/// Snap, falling back to the input on any failure.
///
/// Fewer than two points are returned untouched without calling the snapper.
pub fn snap_or_fallback<S: RoadSnapper + ?Sized>(
    snapper: &S,
    coordinates: &[(f64, f64)],
) -> SnapOutcome {
    if coordinates.len() < 2 {
        debug!("[RoadSnapper] {} point(s), nothing to snap", coordinates.len());
        return SnapOutcome::unchanged(coordinates, None);
    }
    settle(coordinates, snapper.snap(coordinates))
}

/// Snap on a worker thread, giving up after `timeout`.
///
/// [`RoadSnapper::snap`] is blocking and carries no deadline of its own, so the
/// bound is enforced from outside the call. A snapper that overruns is
/// abandoned and its late answer is discarded. Async callers of
/// `OsrmSnapper::snap_async` (feature `http`) are bounded by
/// `tokio::time::timeout` instead.
pub fn snap_or_fallback_within(
    snapper: Arc<dyn RoadSnapper + Send + Sync>,
    coordinates: &[(f64, f64)],
    timeout: Duration,
) -> SnapOutcome {
    if coordinates.len() < 2 {
        debug!("[RoadSnapper] {} point(s), nothing to snap", coordinates.len());
        return SnapOutcome::unchanged(coordinates, None);
    }

    let (tx, rx) = mpsc::channel();
    let owned = coordinates.to_vec();
    let spawned = std::thread::Builder::new()
        .name("road-snapper".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(snapper.snap(&owned));
        });

    let result = match spawned {
        Err(e) => Err(RouteError::snapping(format!("failed to start worker: {}", e))),
        Ok(_) => match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(RouteError::snapping(format!(
                "timed out after {:?}",
                timeout
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RouteError::snapping(
                "worker exited without an answer",
            )),
        },
    };
    settle(coordinates, result)
}
