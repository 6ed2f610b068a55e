//! Run configuration
//!
//! Loaded from an optional TOML file; every field has a default so a partial
//! file (or none at all) is valid. CLI flags override individual fields.

use std::path::Path;

use butterfly_common::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowConfig {
    /// Half-angle between an arrow's two rays, degrees
    pub alpha_deg: f64,
    /// Ray length in map units
    pub arrow_length: f64,
    /// Travelled distance between two flow arrows along a lane
    pub arrow_gap: f64,
    /// Circle radius used when drawing points
    pub point_radius: f64,
    /// Run the connectivity matcher on the rayon pool
    pub parallel: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            alpha_deg: 10.0,
            arrow_length: 0.5,
            arrow_gap: 5.0,
            point_radius: 0.2,
            parallel: false,
        }
    }
}

impl FlowConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: FlowConfig =
            toml::from_str(s).map_err(|e| Error::ParseError(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidInput(msg.to_string()));

        if !self.alpha_deg.is_finite() || self.alpha_deg <= 0.0 || self.alpha_deg >= 180.0 {
            return invalid("alpha_deg must be in (0, 180)");
        }
        if !self.arrow_length.is_finite() || self.arrow_length <= 0.0 {
            return invalid("arrow_length must be positive");
        }
        if !self.arrow_gap.is_finite() || self.arrow_gap <= 0.0 {
            return invalid("arrow_gap must be positive");
        }
        if !self.point_radius.is_finite() || self.point_radius <= 0.0 {
            return invalid("point_radius must be positive");
        }
        Ok(())
    }
}
