//! Unified error handling for the geophoto-route library.
//!
//! Algorithmic failures (empty batch, bad coordinates, bad configuration)
//! surface as typed errors. Road-snapping failures are also represented
//! here, but the pipeline recovers from them locally.

use thiserror::Error;

/// Unified error type for route operations.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Simplification was asked to process zero points
    #[error("No points to simplify: the batch is empty")]
    EmptyInput,

    /// A point lies outside latitude [-90, 90] / longitude [-180, 180]
    #[error("Point '{source_id}' has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinate {
        source_id: String,
        latitude: f64,
        longitude: f64,
    },

    /// Configuration value out of range
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// Capture time string could not be parsed
    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },

    /// Road snapping service failure (always recovered by the caller)
    #[error("{}", snapping_message(.message, .status_code))]
    Snapping {
        message: String,
        status_code: Option<u16>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn snapping_message(message: &str, status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("Road snapping failed ({}): {}", code, message),
        None => format!("Road snapping failed: {}", message),
    }
}

impl RouteError {
    pub(crate) fn snapping(message: impl Into<String>) -> Self {
        RouteError::Snapping {
            message: message.into(),
            status_code: None,
        }
    }
}

/// Result type alias for route operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Extension trait for converting Option to RouteError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an empty input error.
    fn ok_or_empty_input(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_input(self) -> Result<T> {
        self.ok_or(RouteError::EmptyInput)
    }
}
