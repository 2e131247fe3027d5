//! KML 2.2 writer: one placemark per kept photo plus the route line.

use std::io::{self, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::SimplifiedRoute;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
const LINE_STYLE_ID: &str = "route-line";

/// Presentation settings for the KML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmlOptions {
    pub document_name: String,
    /// Name of the line placemark
    pub path_name: String,
    /// Prefix the first/last placemark names with `start: ` / `end: `
    pub label_endpoints: bool,
    /// Line colour in KML `aabbggrr` notation. Default: opaque red
    pub line_color: String,
    pub line_width: f64,
}

impl Default for KmlOptions {
    fn default() -> Self {
        Self {
            document_name: "Survey route".to_string(),
            path_name: "Chronological route".to_string(),
            label_endpoints: false,
            line_color: "ff0000ff".to_string(),
            line_width: 3.0,
        }
    }
}

/// Write the route as KML, drawing the line through the kept points.
pub fn write_kml<W: Write>(route: &SimplifiedRoute, options: &KmlOptions, writer: W) -> Result<()> {
    write_kml_with_path(route, &route.coordinates(), options, writer)
}

/// Write the route as KML, drawing the line through `path`
/// (`(latitude, longitude)` pairs, e.g. a road-snapped geometry).
///
/// The line is omitted when `path` has fewer than two points.
pub fn write_kml_with_path<W: Write>(
    route: &SimplifiedRoute,
    path: &[(f64, f64)],
    options: &KmlOptions,
    writer: W,
) -> Result<()> {
    let mut w = Writer::new_with_indent(writer, b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut kml = BytesStart::new("kml");
    kml.push_attribute(("xmlns", KML_NAMESPACE));
    w.write_event(Event::Start(kml.borrow()))?;
    w.write_event(Event::Start(BytesStart::new("Document")))?;
    text_element(&mut w, "name", &options.document_name)?;

    let mut style = BytesStart::new("Style");
    style.push_attribute(("id", LINE_STYLE_ID));
    w.write_event(Event::Start(style.borrow()))?;
    w.write_event(Event::Start(BytesStart::new("LineStyle")))?;
    text_element(&mut w, "color", &options.line_color)?;
    text_element(&mut w, "width", &options.line_width.to_string())?;
    w.write_event(Event::End(BytesEnd::new("LineStyle")))?;
    w.write_event(Event::End(style.to_end()))?;

    let last_index = route.len().saturating_sub(1);
    for (i, entry) in route.iter().enumerate() {
        let p = &entry.point;
        let mut name = p.coord_name();
        if options.label_endpoints {
            if i == 0 {
                name = format!("start: {}", name);
            } else if i == last_index {
                name = format!("end: {}", name);
            }
        }
        let description = format!(
            "File: {}\nDate: {}",
            p.source_id,
            p.timestamp.format(TIMESTAMP_FORMAT)
        );

        w.write_event(Event::Start(BytesStart::new("Placemark")))?;
        text_element(&mut w, "name", &name)?;
        text_element(&mut w, "description", &description)?;
        w.write_event(Event::Start(BytesStart::new("Point")))?;
        text_element(
            &mut w,
            "coordinates",
            &format!("{},{},0", p.longitude, p.latitude),
        )?;
        w.write_event(Event::End(BytesEnd::new("Point")))?;
        w.write_event(Event::End(BytesEnd::new("Placemark")))?;
    }

    if path.len() > 1 {
        let coords: Vec<String> = path
            .iter()
            .map(|(lat, lng)| format!("{},{},0", lng, lat))
            .collect();

        w.write_event(Event::Start(BytesStart::new("Placemark")))?;
        text_element(&mut w, "name", &options.path_name)?;
        text_element(&mut w, "styleUrl", &format!("#{}", LINE_STYLE_ID))?;
        w.write_event(Event::Start(BytesStart::new("LineString")))?;
        text_element(&mut w, "tessellate", "1")?;
        text_element(&mut w, "coordinates", &coords.join(" "))?;
        w.write_event(Event::End(BytesEnd::new("LineString")))?;
        w.write_event(Event::End(BytesEnd::new("Placemark")))?;
    }

    w.write_event(Event::End(BytesEnd::new("Document")))?;
    w.write_event(Event::End(kml.to_end()))?;

    let mut inner = w.into_inner();
    inner.write_all(b"\n")?;
    inner.flush()?;
    Ok(())
}

/// Render the KML document to a string.
pub fn kml_string(route: &SimplifiedRoute, options: &KmlOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_kml(route, options, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `<name>text</name>`, with the text escaped.
fn text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::annotate;
    use crate::GeoPoint;
    use chrono::NaiveDate;

    fn route(n: usize) -> SimplifiedRoute {
        let t0 = NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let points: Vec<GeoPoint> = (0..n)
            .map(|i| {
                GeoPoint::new(
                    format!("IMG_{}.jpg", i),
                    -15.79 - i as f64 * 0.001,
                    -47.88,
                    t0 + chrono::Duration::minutes(i as i64),
                )
            })
            .collect();
        annotate(&points)
    }

    #[test]
    fn test_placemark_per_point_and_line() {
        let kml = kml_string(&route(3), &KmlOptions::default()).unwrap();
        assert_eq!(kml.matches("<Point>").count(), 3);
        assert_eq!(kml.matches("<LineString>").count(), 1);
        assert!(kml.contains("<name>-15.790000, -47.880000</name>"));
        assert!(kml.contains("<coordinates>-47.88,-15.79,0</coordinates>"));
        assert!(kml.contains("File: IMG_1.jpg\nDate: 2024-05-02 09:01:00"));
        assert!(kml.contains("<color>ff0000ff</color>"));
        assert!(kml.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn test_single_point_has_no_line() {
        let kml = kml_string(&route(1), &KmlOptions::default()).unwrap();
        assert_eq!(kml.matches("<Point>").count(), 1);
        assert!(!kml.contains("<LineString>"));
    }

    #[test]
    fn test_endpoint_labels() {
        let options = KmlOptions {
            label_endpoints: true,
            ..KmlOptions::default()
        };
        let kml = kml_string(&route(3), &options).unwrap();
        assert!(kml.contains("<name>start: -15.790000, -47.880000</name>"));
        assert!(kml.contains("<name>end: -15.792000, -47.880000</name>"));
        assert!(kml.contains("<name>-15.791000, -47.880000</name>"));
    }

    #[test]
    fn test_custom_path() {
        let r = route(2);
        let path = vec![(-15.79, -47.88), (-15.7905, -47.8801), (-15.791, -47.88)];
        let mut buf = Vec::new();
        write_kml_with_path(&r, &path, &KmlOptions::default(), &mut buf).unwrap();
        let kml = String::from_utf8(buf).unwrap();
        assert!(kml.contains("-47.88,-15.79,0 -47.8801,-15.7905,0 -47.88,-15.791,0"));
    }

    #[test]
    fn test_escapes_text() {
        let options = KmlOptions {
            document_name: "Road <A&B>".to_string(),
            ..KmlOptions::default()
        };
        let kml = kml_string(&route(1), &options).unwrap();
        assert!(kml.contains("<name>Road &lt;A&amp;B&gt;</name>"));
    }

    #[test]
    fn test_output_is_well_formed() {
        let options = KmlOptions {
            document_name: "Q&A \"north\" <loop>".to_string(),
            ..KmlOptions::default()
        };
        let kml = kml_string(&route(3), &options).unwrap();

        let mut reader = quick_xml::Reader::from_str(&kml);
        let mut names = Vec::new();
        let mut placemarks = 0;
        let mut in_name = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"name" => in_name = true,
                Event::Start(e) if e.name().as_ref() == b"Placemark" => placemarks += 1,
                Event::Text(t) if in_name => {
                    names.push(t.unescape().unwrap().into_owned());
                    in_name = false;
                }
                Event::End(_) => in_name = false,
                Event::Eof => break,
                _ => {}
            }
        }

        assert_eq!(placemarks, 4);
        assert_eq!(names[0], "Q&A \"north\" <loop>");
        assert_eq!(names.last().map(String::as_str), Some("Chronological route"));
    }
}
