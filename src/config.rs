//! Tunable constants for a sculpting session.
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it changes:
//!
//! ```
//! use chisel::config::SculptConfig;
//!
//! let config = SculptConfig::from_json_str(r#"{ "history_capacity": 50 }"#).unwrap();
//! assert_eq!(config.history_capacity, 50);
//! assert_eq!(config.min_tick_interval_ms, 16);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SculptError};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SculptConfig {
    /// Maximum number of undo (and redo) snapshots.
    pub history_capacity: usize,

    /// Drag ticks closer together than this are dropped.
    pub min_tick_interval_ms: u64,

    /// How long cached normals may be reused during an inflate/deflate drag.
    pub normal_budget_ms: u64,

    /// Pointer travel, in pixels, below which a press/release is a click.
    pub click_threshold_px: f64,

    /// Upper bound for brush strength.
    pub max_strength: f64,

    /// Drag deltas shorter than this are discarded.
    pub noise_floor: f64,

    /// Topology operations producing more vertices than this fail.
    pub max_vertices: usize,

    /// Evaluate brush kernels on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SculptConfig {
    fn default() -> Self {
        Self {
            history_capacity: 30,
            min_tick_interval_ms: 16,
            normal_budget_ms: 80,
            click_threshold_px: 6.0,
            max_strength: 2.5,
            noise_floor: 1e-10,
            max_vertices: 4_000_000,
            parallel: false,
        }
    }
}

impl SculptConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SculptConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SculptError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(SculptError::invalid_param(
                "history_capacity",
                self.history_capacity,
                "must be at least 1",
            ));
        }
        if self.click_threshold_px.is_nan() || self.click_threshold_px < 0.0 {
            return Err(SculptError::invalid_param(
                "click_threshold_px",
                self.click_threshold_px,
                "must be non-negative",
            ));
        }
        if !self.max_strength.is_finite() || self.max_strength <= 0.0 {
            return Err(SculptError::invalid_param(
                "max_strength",
                self.max_strength,
                "must be positive",
            ));
        }
        if self.noise_floor.is_nan() || self.noise_floor < 0.0 {
            return Err(SculptError::invalid_param(
                "noise_floor",
                self.noise_floor,
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Minimum spacing between accepted drag ticks.
    pub fn min_tick_interval(&self) -> Duration {
        Duration::from_millis(self.min_tick_interval_ms)
    }

    /// Staleness budget for cached normals.
    pub fn normal_budget(&self) -> Duration {
        Duration::from_millis(self.normal_budget_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SculptConfig::default();
        assert_eq!(config.history_capacity, 30);
        assert_eq!(config.min_tick_interval(), Duration::from_millis(16));
        assert_eq!(config.normal_budget(), Duration::from_millis(80));
        assert_eq!(config.click_threshold_px, 6.0);
        assert_eq!(config.max_strength, 2.5);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = SculptConfig::from_json_str(r#"{ "parallel": true, "normal_budget_ms": 5 }"#)
            .unwrap();
        assert!(config.parallel);
        assert_eq!(config.normal_budget_ms, 5);
        assert_eq!(config.history_capacity, 30);

        assert_eq!(SculptConfig::from_json_str("{}").unwrap(), SculptConfig::default());
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            SculptConfig::from_json_str("{ not json"),
            Err(SculptError::Config(_))
        ));
        assert!(matches!(
            SculptConfig::from_json_str(r#"{ "history_capacity": 0 }"#),
            Err(SculptError::InvalidParameter { name: "history_capacity", .. })
        ));
        assert!(matches!(
            SculptConfig::from_json_str(r#"{ "max_strength": -1.0 }"#),
            Err(SculptError::InvalidParameter { name: "max_strength", .. })
        ));
    }

    #[test]
    fn test_roundtrip_json() {
        let config = SculptConfig {
            history_capacity: 12,
            ..SculptConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SculptConfig::from_json_str(&json).unwrap(), config);
    }
}
