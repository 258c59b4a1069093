//! Experience Settings
//!
//! Tunables for transition pacing, input disambiguation, the viewer camera
//! and the XR ray visual. Every field has a default, so a settings file only
//! needs to mention what it overrides.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parallax::settings::ExperienceSettings;
//!
//! // Defaults
//! let settings = ExperienceSettings::default();
//!
//! // Partial override from JSON
//! let settings = ExperienceSettings::from_json_str(r#"{ "settle_delay_ms": 500 }"#)?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Runtime configuration for an [`Experience`](crate::experience::Experience).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceSettings {
    /// Pause between clearing a scene and running its successor's setup.
    pub settle_delay_ms: u64,

    /// Pointer travel (pixels, per axis) after which a press becomes a drag.
    pub drag_threshold_px: f32,

    /// Maximum length of the XR controller ray visual, in meters.
    pub ray_length: f32,

    /// Vertical field of view of the fallback camera, in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,

    /// Eye height used when no immersive session is available.
    pub fallback_eye_height: f32,
    /// Eye height used for immersive sessions without floor tracking.
    pub xr_eye_height: f32,

    /// Vertical bob applied to idle buttons and characters.
    pub idle_amplitude: f32,
    /// Bob angular speed, in radians per millisecond.
    pub idle_speed: f32,

    /// Object names whose registrations survive the scene-clear sweep.
    pub handoff_objects: Vec<String>,
}

impl Default for ExperienceSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            drag_threshold_px: 5.0,
            ray_length: 5.0,
            fov_degrees: 70.0,
            near: 0.01,
            far: 100.0,
            fallback_eye_height: 0.7,
            xr_eye_height: 1.6,
            idle_amplitude: 0.05,
            idle_speed: 0.002,
            handoff_objects: vec!["nextButton".to_string()],
        }
    }
}

impl ExperienceSettings {
    /// Parses settings from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Eye height for the given viewer mode.
    #[inline]
    #[must_use]
    pub fn eye_height(&self, mode: crate::scene::ViewerMode) -> f32 {
        match mode {
            crate::scene::ViewerMode::Immersive => self.xr_eye_height,
            crate::scene::ViewerMode::Fallback => self.fallback_eye_height,
        }
    }
}
