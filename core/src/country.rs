//! Country records and the population they form.
//!
//! A `Population` is the only shape the engine accepts: iso3 keys are
//! normalized and unique, and every record's projection anchors are
//! deduplicated and sorted before any scoring runs.

use crate::{
    error::{OciError, OciResult},
    stats::clamp_percent,
    types::{Iso3, MonthsAhead},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One forecast anchor from the upstream regression ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub months_ahead: MonthsAhead,
    pub score: f64,
    /// Binary neglect classifier output for this horizon, when available.
    #[serde(default)]
    pub neglect_flag_pred: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingTrendPoint {
    pub year: i32,
    pub req_usd: f64,
    pub funded_usd: f64,
}

/// One humanitarian-funding snapshot for one country.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub iso3: Iso3,
    pub country: String,
    pub population: f64,
    pub in_need: f64,
    pub targeted: f64,
    pub affected: f64,
    pub reached: f64,
    pub funding_required: f64,
    pub funding_received: f64,
    pub revised_plan_requirements: f64,
    pub percent_funded: f64,
    #[serde(default)]
    pub latest_funding_year: i32,
    pub severity_score: f64,
    #[serde(default)]
    pub overlooked_score: Option<f64>,
    #[serde(default)]
    pub ensemble_score: Option<f64>,
    #[serde(default)]
    pub neglect_score: Option<f64>,
    #[serde(default)]
    pub donor_diversity_score: Option<f64>,
    #[serde(default)]
    pub internal_funding_usd: Option<f64>,
    #[serde(default)]
    pub global_cluster_gap_pct: Option<f64>,
    #[serde(default)]
    pub future_projections: Vec<ProjectionPoint>,
    #[serde(default)]
    pub funding_trend: Vec<FundingTrendPoint>,
}

impl CountryRecord {
    pub fn new(iso3: impl Into<Iso3>, country: impl Into<String>) -> Self {
        Self {
            iso3: iso3.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    /// Funding requirement: the appeal requirement when positive,
    /// otherwise the revised plan requirement.
    pub fn funding_requirement(&self) -> f64 {
        if self.funding_required > 0.0 {
            self.funding_required
        } else {
            self.revised_plan_requirements
        }
    }

    /// Percent funded for a hypothetical `funding_received`. Falls back
    /// to the reported `percent_funded` when there is no requirement.
    pub fn percent_funded_for(&self, funding_received: f64) -> f64 {
        let requirement = self.funding_requirement();
        if requirement <= 0.0 {
            return clamp_percent(self.percent_funded);
        }
        clamp_percent(funding_received / requirement * 100.0)
    }

    /// Baseline neglect score in [0, 100].
    ///
    /// Precedence: ensemble score, then neglect score, then the reported
    /// overlooked score, then severity.
    pub fn baseline_neglect(&self) -> f64 {
        clamp_percent(
            self.ensemble_score
                .or(self.neglect_score)
                .or(self.overlooked_score)
                .unwrap_or(self.severity_score),
        )
    }

    /// Projection anchors, deduplicated by horizon (last write wins),
    /// sorted ascending, zero horizons and non-finite scores dropped.
    pub fn projection_anchors(&self) -> Vec<ProjectionPoint> {
        normalize_projections(&self.future_projections)
    }
}

pub fn normalize_projections(points: &[ProjectionPoint]) -> Vec<ProjectionPoint> {
    let mut by_horizon: BTreeMap<MonthsAhead, ProjectionPoint> = BTreeMap::new();
    for point in points {
        if point.months_ahead == 0 || !point.score.is_finite() {
            continue;
        }
        by_horizon.insert(
            point.months_ahead,
            ProjectionPoint {
                score: clamp_percent(point.score),
                ..*point
            },
        );
    }
    by_horizon.into_values().collect()
}

/// Normalize a user- or upstream-supplied iso3: trimmed and upper-cased.
pub fn normalize_iso3(iso3: &str) -> Iso3 {
    iso3.trim().to_ascii_uppercase()
}

/// An immutable, keyed collection of country records.
#[derive(Debug, Clone, Default)]
pub struct Population {
    records: Vec<CountryRecord>,
    index: HashMap<Iso3, usize>,
}

impl Population {
    /// Build a population. Record order is preserved: it is the tie-break
    /// order for every ranking.
    pub fn new(records: Vec<CountryRecord>) -> OciResult<Self> {
        let mut index = HashMap::with_capacity(records.len());
        let mut normalized = Vec::with_capacity(records.len());

        for mut record in records {
            record.iso3 = normalize_iso3(&record.iso3);
            record.future_projections = normalize_projections(&record.future_projections);
            if index.insert(record.iso3.clone(), normalized.len()).is_some() {
                return Err(OciError::DuplicateCountry { iso3: record.iso3 });
            }
            normalized.push(record);
        }

        Ok(Self {
            records: normalized,
            index,
        })
    }

    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    pub fn get(&self, iso3: &str) -> Option<&CountryRecord> {
        self.index.get(iso3).map(|&i| &self.records[i])
    }

    pub fn contains(&self, iso3: &str) -> bool {
        self.index.contains_key(iso3)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
