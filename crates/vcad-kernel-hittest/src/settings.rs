//! Hit-test settings and the per-query context.

use serde::{Deserialize, Serialize};

use crate::error::{HitTestError, Result};

/// Tolerances for geometry without surface area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestSettings {
    /// Maximum world-space distance between a ray and a line segment
    /// that still counts as a hit.
    pub line_hit_thickness: f64,
    /// Maximum world-space distance between a ray and a point that still
    /// counts as a hit.
    pub point_hit_radius: f64,
}

impl Default for HitTestSettings {
    fn default() -> Self {
        Self {
            line_hit_thickness: 0.05,
            point_hit_radius: 0.05,
        }
    }
}

impl HitTestSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.line_hit_thickness.is_finite() && self.line_hit_thickness >= 0.0) {
            return Err(HitTestError::InvalidSettings(
                "line_hit_thickness must be finite and non-negative".into(),
            ));
        }
        if !(self.point_hit_radius.is_finite() && self.point_hit_radius >= 0.0) {
            return Err(HitTestError::InvalidSettings(
                "point_hit_radius must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Shared state for one hit-test pass, handed through to spatial indices
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct HitTestContext {
    /// Tolerances for line and point geometry.
    pub settings: HitTestSettings,
}

impl HitTestContext {
    /// Create a context with the given settings.
    pub fn new(settings: HitTestSettings) -> Self {
        Self { settings }
    }
}
