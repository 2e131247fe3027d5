//! End-to-end processing of one upload batch.
//!
//! raw points -> simplify (sort + filter) -> annotate -> summary
//! -> [optional road snapping]. Each call is independent; nothing is kept
//! between batches.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::{write_kml_with_path, KmlOptions};
use crate::metrics::RouteSummary;
use crate::simplify::simplify;
use crate::snap::{snap_or_fallback_within, RoadSnapper, SnapOutcome};
use crate::{FilterConfig, GeoPoint, SimplifiedRoute};

/// A road snapper that can be moved onto a worker thread.
pub type SharedSnapper = Arc<dyn RoadSnapper + Send + Sync>;

/// Result of processing one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedBatch {
    pub route: SimplifiedRoute,
    pub summary: RouteSummary,
    /// Present only when snapping was attempted
    pub snapped: Option<SnapOutcome>,
}

impl ProcessedBatch {
    /// Coordinates for the route line: the snapped geometry when available,
    /// otherwise the kept points.
    pub fn path(&self) -> Vec<(f64, f64)> {
        match &self.snapped {
            Some(outcome) => outcome.coordinates.clone(),
            None => self.route.coordinates(),
        }
    }

    /// Write the batch as KML, drawing the line along [`ProcessedBatch::path`].
    pub fn write_kml<W: Write>(&self, options: &KmlOptions, writer: W) -> Result<()> {
        write_kml_with_path(&self.route, &self.path(), options, writer)
    }
}

/// Simplify and annotate a batch.
pub fn process_batch(points: Vec<GeoPoint>, config: &FilterConfig) -> Result<ProcessedBatch> {
    let original_count = points.len();
    let route = simplify(points, config)?;
    let summary = RouteSummary::new(original_count, &route);

    info!("[Pipeline] {}", summary.describe());

    Ok(ProcessedBatch {
        route,
        summary,
        snapped: None,
    })
}

/// Simplify, annotate, then snap the route onto roads.
///
/// The snapper gets at most `timeout`; an overrun, an error or an empty
/// answer never fails the batch, the outcome records the fallback instead.
pub fn process_batch_with_snapper(
    points: Vec<GeoPoint>,
    config: &FilterConfig,
    snapper: SharedSnapper,
    timeout: Duration,
) -> Result<ProcessedBatch> {
    let mut batch = process_batch(points, config)?;
    batch.snapped = Some(snap_or_fallback_within(
        snapper,
        &batch.route.coordinates(),
        timeout,
    ));
    Ok(batch)
}

/// Run a batch as described by a [`PipelineConfig`].
///
/// Snapping runs only when `config.snapping.enabled`, bounded by
/// `config.snapping.timeout()`. `snapper` overrides the configured service;
/// without one, the OSRM client from `config.snapping` is used when the
/// `http` feature is on.
pub fn process_batch_with_config(
    points: Vec<GeoPoint>,
    config: &PipelineConfig,
    snapper: Option<SharedSnapper>,
) -> Result<ProcessedBatch> {
    config.validate()?;
    let mut batch = process_batch(points, &config.filter)?;

    if !config.snapping.enabled {
        return Ok(batch);
    }

    let coordinates = batch.route.coordinates();
    batch.snapped = Some(match snapper.map(Ok).or_else(|| configured_snapper(config)) {
        Some(Ok(snapper)) => {
            snap_or_fallback_within(snapper, &coordinates, config.snapping.timeout())
        }
        Some(Err(e)) => {
            warn!("[Pipeline] {}, keeping straight-line route", e);
            SnapOutcome::unchanged(&coordinates, Some(e.to_string()))
        }
        None => {
            warn!("[Pipeline] Snapping enabled but no road snapper is available");
            SnapOutcome::unchanged(&coordinates, Some("no road snapper available".to_string()))
        }
    });
    Ok(batch)
}

#[cfg(feature = "http")]
fn configured_snapper(config: &PipelineConfig) -> Option<Result<SharedSnapper>> {
    Some(
        crate::http::OsrmSnapper::new(&config.snapping)
            .map(|snapper| Arc::new(snapper) as SharedSnapper),
    )
}

#[cfg(not(feature = "http"))]
fn configured_snapper(_config: &PipelineConfig) -> Option<Result<SharedSnapper>> {
    None
}
