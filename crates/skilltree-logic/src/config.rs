//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```
//! use skilltree_logic::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "viewport": { "max_scale": 5.0 } }"#).unwrap();
//! assert_eq!(config.viewport.max_scale, 5.0);
//! assert_eq!(config.viewport.min_scale, 0.25);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::viewport::ViewportState;

/// Pan/zoom limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplicative step per wheel notch or zoom button press.
    pub zoom_step: f32,
    /// State used on first launch and by "reset view".
    pub initial: ViewportState,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 3.0,
            zoom_step: 1.1,
            initial: ViewportState::default(),
        }
    }
}

/// Fallback placement for nodes without authored coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between BFS depth layers.
    pub layer_spacing: f32,
    /// Horizontal distance between siblings in a layer.
    pub sibling_spacing: f32,
    /// Radius for nodes without an authored radius.
    pub default_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layer_spacing: 140.0,
            sibling_spacing: 110.0,
            default_radius: 28.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Quiescence window before a debounced viewport write fires.
    pub debounce_secs: f64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { debounce_secs: 0.5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: ViewportConfig,
    pub layout: LayoutConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_scale must be positive, got {}",
                v.min_scale
            )));
        }
        if v.min_scale > v.max_scale {
            return Err(ConfigError::Invalid(format!(
                "min_scale {} exceeds max_scale {}",
                v.min_scale, v.max_scale
            )));
        }
        if !(v.zoom_step > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom_step must be greater than 1, got {}",
                v.zoom_step
            )));
        }
        if !(v.initial.scale >= v.min_scale && v.initial.scale <= v.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "initial scale {} outside [{}, {}]",
                v.initial.scale, v.min_scale, v.max_scale
            )));
        }
        if !(self.persistence.debounce_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "debounce_secs must be non-negative, got {}",
                self.persistence.debounce_secs
            )));
        }
        if !(self.layout.default_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "default_radius must be positive, got {}",
                self.layout.default_radius
            )));
        }
        Ok(())
    }
}
