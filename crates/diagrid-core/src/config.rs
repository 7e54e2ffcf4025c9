//! Editor tunables.

use crate::error::ConfigError;
use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default number of undo snapshots kept.
pub const MAX_UNDO_HISTORY: usize = 20;

/// Auto edge-scroll settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    /// Distance from the viewport edge (screen px) that arms scrolling.
    pub edge_threshold: f64,
    /// Interval between synthetic drag ticks in milliseconds.
    pub interval_ms: u64,
    /// World distance scrolled per tick.
    pub step: f64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 30.0,
            interval_ms: 16,
            step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_capacity: usize,
    /// Clearance kept between routed connect lines and shape boxes.
    pub connect_margin: f64,
    pub paste_offset: Vec2,
    pub default_shape_size: Size,
    /// Length-equivalent cost of one bend when scoring routes.
    pub bend_penalty: f64,
    pub auto_scroll: AutoScrollConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: MAX_UNDO_HISTORY,
            connect_margin: 20.0,
            paste_offset: Vec2::new(20.0, 20.0),
            default_shape_size: Size::new(100.0, 100.0),
            bend_penalty: 1.0,
            auto_scroll: AutoScrollConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.connect_margin >= 0.0 && self.connect_margin.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "connect_margin",
                reason: format!("{} is not a non-negative number", self.connect_margin),
            });
        }
        if self.bend_penalty < 0.0 {
            return Err(ConfigError::Invalid {
                field: "bend_penalty",
                reason: "must not be negative".to_string(),
            });
        }
        if self.auto_scroll.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "auto_scroll.interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.default_shape_size.width <= 0.0 || self.default_shape_size.height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_shape_size",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
