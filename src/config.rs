//! Run configuration.
//!
//! All sections default, so a partial JSON document such as
//! `{"filter": {"min_radius_m": 25}}` is a complete configuration.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::export::KmlOptions;
use crate::snap::SnapConfig;
use crate::FilterConfig;

/// Settings for one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub snapping: SnapConfig,
    pub kml: KmlOptions,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("[PipelineConfig] Loading {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;

        if self.snapping.enabled {
            if self.snapping.timeout_secs == 0 {
                return Err(RouteError::InvalidConfig {
                    message: "snapping.timeout_secs must be greater than 0".to_string(),
                });
            }
            if self.snapping.base_url.trim().is_empty() {
                return Err(RouteError::InvalidConfig {
                    message: "snapping.base_url must not be empty".to_string(),
                });
            }
        }

        if !(self.kml.line_width.is_finite() && self.kml.line_width > 0.0) {
            return Err(RouteError::InvalidConfig {
                message: format!("kml.line_width must be positive, got {}", self.kml.line_width),
            });
        }
        Ok(())
    }
}
