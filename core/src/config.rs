use crate::{
    error::{OciError, OciResult},
    oci::OciWeights,
};
use serde::{Deserialize, Serialize};

/// Tunables for scoring, ranking and impact classification.
///
/// The quarterly schedule and the neglect threshold are not here: they
/// are fixed by the projection model, see `schedule` and `projection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub oci_weights: OciWeights,
    /// Rows in each quarter's top-overlooked board.
    pub top_overlooked_limit: usize,
    /// Scenario leaderboard rows diffed against the baseline.
    pub leaderboard_limit: usize,
    /// Rank window on each side of the target when picking neighbours.
    pub neighbour_radius: usize,
    /// Extra rank movers pulled into the neighbourhood.
    pub mover_cap: usize,
    /// Impacts (and arrows) kept after sorting.
    pub impact_cap: usize,
    pub outlier_z_threshold: f64,
    pub comparable_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oci_weights: OciWeights::STANDARD,
            top_overlooked_limit: 12,
            leaderboard_limit: 12,
            neighbour_radius: 2,
            mover_cap: 6,
            impact_cap: 8,
            outlier_z_threshold: 1.8,
            comparable_rows: 5,
        }
    }
}

impl EngineConfig {
    /// Load `{data_dir}/engine.json`. Missing keys take their defaults.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)?;
        log::info!("Engine config loaded from {path}");
        Ok(config)
    }

    pub fn from_json(json: &str) -> OciResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OciResult<()> {
        self.oci_weights.validate()?;
        if self.leaderboard_limit == 0 {
            return Err(OciError::InvalidConfig {
                reason: "leaderboard_limit must be at least 1".into(),
            });
        }
        if !(self.outlier_z_threshold.is_finite() && self.outlier_z_threshold > 0.0) {
            return Err(OciError::InvalidConfig {
                reason: format!(
                    "outlier_z_threshold must be positive, got {}",
                    self.outlier_z_threshold
                ),
            });
        }
        Ok(())
    }
}
