//! Project-level records for the outlier and comparables passes.

use crate::types::{Iso3, ProjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierFlag {
    /// Reaches unusually few people per dollar for its cluster.
    Low,
    /// Reaches unusually many people per dollar for its cluster.
    High,
    #[default]
    None,
}

impl OutlierFlag {
    pub fn from_z(z: f64, threshold: f64) -> Self {
        if z >= threshold {
            OutlierFlag::High
        } else if z <= -threshold {
            OutlierFlag::Low
        } else {
            OutlierFlag::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierFlag::Low => "low",
            OutlierFlag::High => "high",
            OutlierFlag::None => "none",
        }
    }
}

/// One project within one country and cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: ProjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub iso3: Iso3,
    pub cluster_name: String,
    pub budget_usd: f64,
    pub people_targeted: f64,
    pub funding_pct: f64,
    /// Budget-to-reach ratio: people targeted per budget dollar.
    #[serde(default)]
    pub bbr: f64,
    #[serde(default)]
    pub bbr_z_score: f64,
    #[serde(default)]
    pub outlier_flag: OutlierFlag,
}

impl ProjectRecord {
    pub fn new(
        project_id: impl Into<ProjectId>,
        cluster_name: impl Into<String>,
        budget_usd: f64,
        people_targeted: f64,
        funding_pct: f64,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            cluster_name: cluster_name.into(),
            budget_usd,
            people_targeted,
            funding_pct,
            bbr: budget_to_reach(people_targeted, budget_usd),
            ..Self::default()
        }
    }
}

/// `people_targeted / max(budget_usd, 1)`.
pub fn budget_to_reach(people_targeted: f64, budget_usd: f64) -> f64 {
    people_targeted / budget_usd.max(1.0)
}
