use serde::{Deserialize, Serialize};

use crate::colors::Yuv;
use crate::error::{DepixelError, Result};

/// Per-channel closeness thresholds for the similarity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            y: 48.0 / 255.0,
            u: 7.0 / 255.0,
            v: 6.0 / 255.0,
        }
    }
}

impl SimilarityThresholds {
    /// Two colors are similar when every channel differs by at most its threshold.
    #[inline]
    pub fn is_close(&self, a: Yuv, b: Yuv) -> bool {
        (a[0] - b[0]).abs() <= self.y
            && (a[1] - b[1]).abs() <= self.u
            && (a[2] - b[2]).abs() <= self.v
    }
}

/// Tuning of the diagonal-crossing heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Vote added when cutting a diagonal would strand a valency-1 pixel.
    pub island: i32,
    /// Reach of the sparse-pixel window: rows and cols `[i - r, i + r + 1)` around
    /// the block's top-left pixel.
    pub sparse_radius: usize,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            island: 5,
            sparse_radius: 3,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepixelConfig {
    pub thresholds: SimilarityThresholds,
    pub heuristics: HeuristicWeights,
}

impl DepixelConfig {
    /// # Errors
    ///
    /// [`DepixelError::InvalidInput`] when a threshold is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        let t = self.thresholds;
        for (name, value) in [("y", t.y), ("u", t.u), ("v", t.v)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DepixelError::invalid(format!(
                    "threshold `{name}` must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closeness_is_per_channel() {
        let t = SimilarityThresholds::default();
        let base = [0.5, 0.5, 0.5];
        assert!(t.is_close(base, [0.5 + 40.0 / 255.0, 0.5, 0.5]));
        assert!(!t.is_close(base, [0.5, 0.5 + 8.0 / 255.0, 0.5]));
        assert!(!t.is_close(base, [0.5, 0.5, 0.5 - 7.0 / 255.0]));
        assert!(t.is_close([0.5 + 40.0 / 255.0, 0.5, 0.5], base));
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: DepixelConfig =
            serde_json::from_str(r#"{ "heuristics": { "island": 7 } }"#).unwrap();
        assert_eq!(cfg.thresholds, SimilarityThresholds::default());
        assert_eq!(cfg.heuristics.island, 7);
        assert_eq!(cfg.heuristics.sparse_radius, 3);
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        assert!(DepixelConfig::default().validate().is_ok());

        let mut cfg = DepixelConfig::default();
        cfg.thresholds.u = -0.1;
        assert!(matches!(cfg.validate(), Err(DepixelError::InvalidInput(_))));

        cfg.thresholds.u = f32::NAN;
        assert!(cfg.validate().is_err());
    }
}
