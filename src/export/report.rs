//! Tabular report: one CSV row per kept photo.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::SimplifiedRoute;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    index: usize,
    source_id: &'a str,
    timestamp: String,
    latitude: f64,
    longitude: f64,
    coordinates: String,
    dms: String,
    segment_distance_m: f64,
    cumulative_distance_km: f64,
}

/// Write the route as CSV with the segment metrics.
pub fn write_report_csv<W: Write>(route: &SimplifiedRoute, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for (index, entry) in route.iter().enumerate() {
        let p = &entry.point;
        csv_writer.serialize(ReportRow {
            index,
            source_id: &p.source_id,
            timestamp: p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            latitude: p.latitude,
            longitude: p.longitude,
            coordinates: p.coord_name(),
            dms: p.dms_name(),
            segment_distance_m: entry.segment_distance_m,
            cumulative_distance_km: entry.cumulative_distance_km,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
