//! OSRM-backed road snapping.
//!
//! Sends the simplified route to an OSRM-compatible `/route` endpoint and
//! reads back the full road geometry. Every request is bounded by the
//! configured timeout; failures surface as [`RouteError::Snapping`] and are
//! turned into a fallback by [`snap_or_fallback`](crate::snap_or_fallback).

use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, RouteError};
use crate::snap::{RoadSnapper, SnapConfig};

/// API response for the route endpoint
#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    geometry: RouteGeometry,
}

#[derive(Debug, Deserialize)]
struct RouteGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat]
}

/// Road snapper backed by an OSRM-compatible routing service.
pub struct OsrmSnapper {
    client: Client,
    base_url: String,
    profile: String,
    timeout: Duration,
}

impl OsrmSnapper {
    pub fn new(config: &SnapConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| RouteError::snapping(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
            timeout: config.timeout(),
        })
    }

    /// Request URL for an ordered `(latitude, longitude)` list.
    pub fn request_url(&self, coordinates: &[(f64, f64)]) -> String {
        let path: Vec<String> = coordinates
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect();
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url,
            self.profile,
            path.join(";")
        )
    }

    /// Fetch the road geometry, giving up after the configured timeout.
    pub async fn snap_async(&self, coordinates: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
        let url = self.request_url(coordinates);
        let start = Instant::now();

        debug!(
            "[OsrmSnapper] Requesting {} waypoints from {}",
            coordinates.len(),
            self.base_url
        );

        let result = tokio::time::timeout(self.timeout, self.fetch(&url))
            .await
            .map_err(|_| RouteError::snapping(format!("timed out after {:?}", self.timeout)))?;

        if let Ok(ref snapped) = result {
            info!(
                "[OsrmSnapper] {} waypoints -> {} road points in {:?}",
                coordinates.len(),
                snapped.len(),
                start.elapsed()
            );
        }
        result
    }

    async fn fetch(&self, url: &str) -> Result<Vec<(f64, f64)>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RouteError::snapping(format!("Request error: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RouteError::Snapping {
                message: format!("HTTP {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RouteError::snapping(format!("Body download error: {}", e)))?;
        parse_route_response(&bytes)
    }
}

impl RoadSnapper for OsrmSnapper {
    /// Blocking snap on a private current-thread runtime.
    ///
    /// Must not be called from inside a tokio runtime; use
    /// [`OsrmSnapper::snap_async`] there.
    fn snap(&self, coordinates: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RouteError::snapping(format!("Runtime error: {}", e)))?;
        rt.block_on(self.snap_async(coordinates))
    }
}

/// Decode an OSRM route response into `(latitude, longitude)` pairs.
pub fn parse_route_response(body: &[u8]) -> Result<Vec<(f64, f64)>> {
    let data: RouteResponse = serde_json::from_slice(body)
        .map_err(|e| RouteError::snapping(format!("JSON parse error: {}", e)))?;

    if data.code != "Ok" {
        return Err(RouteError::snapping(format!(
            "{}: {}",
            data.code,
            data.message.unwrap_or_default()
        )));
    }

    Ok(data
        .routes
        .into_iter()
        .next()
        .map(|route| {
            route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| (lat, lng))
                .collect()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::snap_or_fallback;

    fn offline_config() -> SnapConfig {
        SnapConfig {
            enabled: true,
            // Discard port on loopback: connection is refused immediately
            base_url: "http://127.0.0.1:9/".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_request_url() {
        let snapper = OsrmSnapper::new(&offline_config()).unwrap();
        let url = snapper.request_url(&[(-15.7939, -47.8828), (-15.8, -47.87)]);
        assert_eq!(
            url,
            "http://127.0.0.1:9/route/v1/driving/-47.882800,-15.793900;-47.870000,-15.800000?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_parse_route_response() {
        let body = br#"{
            "code": "Ok",
            "routes": [{
                "distance": 812.4,
                "geometry": {"type": "LineString", "coordinates": [[-47.8828, -15.7939], [-47.8801, -15.7950]]}
            }]
        }"#;
        let coords = parse_route_response(body).unwrap();
        assert_eq!(coords, vec![(-15.7939, -47.8828), (-15.7950, -47.8801)]);
    }

    #[test]
    fn test_parse_error_codes() {
        let body = br#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let err = parse_route_response(body).unwrap_err();
        assert!(err.to_string().contains("NoRoute"));

        assert!(parse_route_response(b"<html>").is_err());
        assert!(parse_route_response(br#"{"code": "Ok", "routes": []}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unreachable_service_falls_back() {
        let snapper = OsrmSnapper::new(&offline_config()).unwrap();
        let coords = vec![(-15.7939, -47.8828), (-15.8, -47.87)];
        let outcome = snap_or_fallback(&snapper, &coords);
        assert!(!outcome.snapped);
        assert_eq!(outcome.coordinates, coords);
        assert!(outcome.fallback_reason.is_some());
    }

    #[tokio::test]
    async fn test_snap_async_reports_error() {
        let snapper = OsrmSnapper::new(&offline_config()).unwrap();
        let result = snapper
            .snap_async(&[(-15.7939, -47.8828), (-15.8, -47.87)])
            .await;
        assert!(matches!(result, Err(RouteError::Snapping { .. })));
    }
}
