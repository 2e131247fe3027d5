//! GeoJSON FeatureCollection for web map viewers.

use serde_json::{json, Value};

use crate::SimplifiedRoute;

/// Point feature per kept photo plus a LineString through them (when > 1 point).
///
/// Coordinates are `[longitude, latitude]` as GeoJSON requires.
pub fn to_geojson(route: &SimplifiedRoute) -> Value {
    let mut features: Vec<Value> = route
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let p = &entry.point;
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [p.longitude, p.latitude],
                },
                "properties": {
                    "index": index,
                    "name": p.coord_name(),
                    "source_id": p.source_id,
                    "timestamp": p.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "segment_distance_m": entry.segment_distance_m,
                    "cumulative_distance_km": entry.cumulative_distance_km,
                },
            })
        })
        .collect();

    if route.len() > 1 {
        let line: Vec<[f64; 2]> = route
            .iter()
            .map(|e| [e.point.longitude, e.point.latitude])
            .collect();
        features.push(json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": line},
            "properties": {"total_distance_km": route.total_distance_km()},
        }));
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
