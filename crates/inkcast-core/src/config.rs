//! Tunables for capture and reconstruction.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Default number of points per flushed stroke.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;
/// Default minimum device-space movement between accepted points.
pub const DEFAULT_MIN_DISTANCE: f64 = 0.1;
/// Default distance in front of the receiver camera at which dots are placed.
pub const DEFAULT_PROJECTION_DEPTH: f64 = 8.0;
/// Default uniform scale of a reconstructed dot.
pub const DEFAULT_DOT_SCALE: f64 = 0.15;

/// Synchronization settings shared by both participants.
///
/// Every field has a default, so a JSON file only needs to name the values
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Points per stroke message.
    pub buffer_capacity: usize,
    /// Samples closer than this to the last accepted point are dropped.
    pub min_distance: f64,
    /// Depth at which the receiver unprojects normalized points.
    pub projection_depth: f64,
    /// Scale applied to every dot.
    pub dot_scale: f64,
    /// Attach drawing-session ids to outgoing messages.
    pub stamp_sessions: bool,
    /// Also report accepted points to the sender for local preview.
    pub local_echo: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_distance: DEFAULT_MIN_DISTANCE,
            projection_depth: DEFAULT_PROJECTION_DEPTH,
            dot_scale: DEFAULT_DOT_SCALE,
            stamp_sessions: true,
            local_echo: false,
        }
    }
}

impl SyncConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate JSON config text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid("buffer_capacity must be at least 1".into()));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_distance must be a non-negative number, got {}",
                self.min_distance
            )));
        }
        if !self.projection_depth.is_finite() || self.projection_depth <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "projection_depth must be positive, got {}",
                self.projection_depth
            )));
        }
        if !self.dot_scale.is_finite() || self.dot_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "dot_scale must be positive, got {}",
                self.dot_scale
            )));
        }
        Ok(())
    }
}
