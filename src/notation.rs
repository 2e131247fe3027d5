//! Decimal and sexagesimal coordinate strings.
//!
//! Pure functions of `(latitude, longitude)`. The sexagesimal form carries
//! rounded seconds into minutes (and minutes into degrees), so a value
//! never prints as `60.00"`.

use serde::{Deserialize, Serialize};

/// Degrees, minutes and seconds of one unsigned coordinate component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    pub fn new(degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
        }
    }

    /// Decompose the magnitude of a decimal value, seconds rounded to 2 places.
    pub fn from_decimal(value: f64) -> Self {
        let magnitude = value.abs();
        let mut degrees = magnitude.trunc();
        let minutes_full = (magnitude - degrees) * 60.0;
        let mut minutes = minutes_full.trunc();
        let mut seconds = ((minutes_full - minutes) * 60.0 * 100.0).round() / 100.0;

        if seconds >= 60.0 {
            seconds -= 60.0;
            minutes += 1.0;
        }
        if minutes >= 60.0 {
            minutes -= 60.0;
            degrees += 1.0;
        }

        Self {
            degrees,
            minutes,
            seconds,
        }
    }

    /// Signed decimal degrees for the given hemisphere reference.
    pub fn to_decimal(&self, hemisphere: char) -> f64 {
        dms_to_decimal(self.degrees, self.minutes, self.seconds, hemisphere)
    }
}

/// Convert degrees/minutes/seconds to signed decimal degrees.
///
/// `S` and `W` (either case) give a negative result.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let dd = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase() {
        'S' | 'W' => -dd,
        _ => dd,
    }
}

/// `"{lat:.6}, {lon:.6}"`
pub fn decimal_notation(latitude: f64, longitude: f64) -> String {
    format!("{:.6}, {:.6}", latitude, longitude)
}

/// `D°M'S"H` for both components, e.g. `15°47'38.04"S, 47°52'58.08"W`.
pub fn dms_notation(latitude: f64, longitude: f64) -> String {
    format!(
        "{}, {}",
        format_component(latitude, 'N', 'S'),
        format_component(longitude, 'E', 'W')
    )
}

/// Latitude component only, e.g. `15°47'38.04"S`.
pub fn dms_latitude(latitude: f64) -> String {
    format_component(latitude, 'N', 'S')
}

/// Longitude component only, e.g. `47°52'58.08"W`.
pub fn dms_longitude(longitude: f64) -> String {
    format_component(longitude, 'E', 'W')
}

fn format_component(value: f64, positive: char, negative: char) -> String {
    let dms = Dms::from_decimal(value);
    let hemisphere = if value < 0.0 { negative } else { positive };
    format!(
        "{}°{}'{:.2}\"{}",
        dms.degrees as u32, dms.minutes as u32, dms.seconds, hemisphere
    )
}
