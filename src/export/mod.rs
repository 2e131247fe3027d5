//! Route export: KML for map viewers, GeoJSON for web maps, CSV report.
//!
//! Exporters only read the simplified route.

pub mod geojson;
pub mod kml;
pub mod report;

pub use geojson::to_geojson;
pub use kml::{kml_string, write_kml, write_kml_with_path, KmlOptions};
pub use report::write_report_csv;
