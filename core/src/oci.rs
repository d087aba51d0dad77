//! Overlooked Crisis Index scorer.
//!
//! OCI = 0.32·severity + 0.28·in-need rate + 0.22·funding gap
//!     + 0.18·coverage mismatch
//!
//! RULE: the four weights sum to exactly 1.0. Any weight set loaded from
//! configuration is validated against that before use.
//!
//! Every input is clamped inside the scorer; callers may hand over raw
//! upstream numbers.

use crate::{
    country::{normalize_iso3, CountryRecord, Population},
    error::{OciError, OciResult},
    stats::{clamp_percent, round_to},
};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OciWeights {
    pub severity: f64,
    pub in_need_rate: f64,
    pub funding_gap: f64,
    pub coverage_mismatch: f64,
}

impl OciWeights {
    pub const STANDARD: OciWeights = OciWeights {
        severity: 0.32,
        in_need_rate: 0.28,
        funding_gap: 0.22,
        coverage_mismatch: 0.18,
    };

    pub fn sum(&self) -> f64 {
        self.severity + self.in_need_rate + self.funding_gap + self.coverage_mismatch
    }

    pub fn validate(&self) -> OciResult<()> {
        let weights = [
            self.severity,
            self.in_need_rate,
            self.funding_gap,
            self.coverage_mismatch,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(OciError::InvalidConfig {
                reason: format!("OCI weights must be finite and non-negative: {self:?}"),
            });
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(OciError::InvalidConfig {
                reason: format!("OCI weights must sum to 1.0, got {sum}"),
            });
        }
        Ok(())
    }
}

impl Default for OciWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The scalar inputs the OCI depends on. Lets callers score a record
/// under overridden funding or severity without cloning it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OciInputs {
    pub severity_score: f64,
    pub population: f64,
    pub in_need: f64,
    pub reached: f64,
    pub funding_required: f64,
    pub revised_plan_requirements: f64,
    pub funding_received: f64,
}

impl From<&CountryRecord> for OciInputs {
    fn from(record: &CountryRecord) -> Self {
        Self {
            severity_score: record.severity_score,
            population: record.population,
            in_need: record.in_need,
            reached: record.reached,
            funding_required: record.funding_required,
            revised_plan_requirements: record.revised_plan_requirements,
            funding_received: record.funding_received,
        }
    }
}

/// Percentages derived from a record's head counts and funding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub in_need_pct: f64,
    pub coverage_pct: f64,
    pub funding_gap: f64,
    pub funding_gap_pct: f64,
}

impl DerivedMetrics {
    pub fn of(inputs: &OciInputs) -> Self {
        let in_need_pct = if inputs.population > 0.0 {
            inputs.in_need / inputs.population * 100.0
        } else {
            0.0
        };
        let coverage_pct = if inputs.in_need > 0.0 {
            inputs.reached / inputs.in_need * 100.0
        } else {
            0.0
        };
        let baseline = if inputs.funding_required > 0.0 {
            inputs.funding_required
        } else {
            inputs.revised_plan_requirements
        };
        let funding_gap = (baseline - inputs.funding_received).max(0.0);
        let funding_gap_pct = if baseline > 0.0 {
            funding_gap / baseline * 100.0
        } else {
            0.0
        };

        Self {
            in_need_pct: clamp_percent(in_need_pct),
            coverage_pct: clamp_percent(coverage_pct),
            funding_gap,
            funding_gap_pct: clamp_percent(funding_gap_pct),
        }
    }

    pub fn of_record(record: &CountryRecord) -> Self {
        Self::of(&OciInputs::from(record))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OciComponents {
    pub severity_component: f64,
    pub in_need_rate_component: f64,
    pub funding_gap_component: f64,
    pub coverage_mismatch_component: f64,
    pub total_score: f64,
}

/// Score a record with the standard weights.
pub fn score(record: &CountryRecord) -> OciComponents {
    score_inputs(&OciInputs::from(record), &OciWeights::STANDARD)
}

/// Score arbitrary inputs. Components and total are rounded to 2 dp.
pub fn score_inputs(inputs: &OciInputs, weights: &OciWeights) -> OciComponents {
    let derived = DerivedMetrics::of(inputs);
    let severity = clamp_percent(inputs.severity_score);
    let in_need_rate = derived.in_need_pct;
    let funding_gap = derived.funding_gap_pct;
    let coverage_mismatch = clamp_percent(100.0 - derived.coverage_pct);

    let total = severity * weights.severity
        + in_need_rate * weights.in_need_rate
        + funding_gap * weights.funding_gap
        + coverage_mismatch * weights.coverage_mismatch;

    OciComponents {
        severity_component: round_to(severity, 2),
        in_need_rate_component: round_to(in_need_rate, 2),
        funding_gap_component: round_to(funding_gap, 2),
        coverage_mismatch_component: round_to(coverage_mismatch, 2),
        total_score: round_to(clamp_percent(total), 2),
    }
}

/// Copies of every record with `overlooked_score` set to its OCI.
pub fn with_overlooked_scores(records: &[CountryRecord]) -> Vec<CountryRecord> {
    records
        .iter()
        .map(|record| CountryRecord {
            overlooked_score: Some(score(record).total_score),
            ..record.clone()
        })
        .collect()
}

/// Records ordered most overlooked first. Ties keep input order.
pub fn rank_overlooked(records: &[CountryRecord]) -> Vec<CountryRecord> {
    let mut scored = with_overlooked_scores(records);
    scored.sort_by(|a, b| {
        let a = a.overlooked_score.unwrap_or(0.0);
        let b = b.overlooked_score.unwrap_or(0.0);
        b.total_cmp(&a)
    });
    scored
}

/// Apply the whole allocation at once to one country and rescore every
/// record. No projection is involved; see `engine` for the quarterly path.
pub fn simulate_funding_allocation(
    population: &Population,
    iso3: &str,
    allocation_usd: f64,
) -> Vec<CountryRecord> {
    let target = normalize_iso3(iso3);
    let extra = if allocation_usd.is_finite() {
        allocation_usd.max(0.0)
    } else {
        0.0
    };

    let funded: Vec<CountryRecord> = population
        .iter()
        .map(|record| {
            if record.iso3 != target {
                return record.clone();
            }
            let funding_received = record.funding_received + extra;
            CountryRecord {
                funding_received,
                percent_funded: record.percent_funded_for(funding_received),
                ..record.clone()
            }
        })
        .collect();

    with_overlooked_scores(&funded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskBand::Critical
        } else if score >= 60.0 {
            RiskBand::High
        } else if score >= 40.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
            RiskBand::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_weights_sum_to_one() {
        assert!((OciWeights::STANDARD.sum() - 1.0).abs() < 1e-12);
        assert!(OciWeights::STANDARD.validate().is_ok());
    }

    #[test]
    fn weights_off_unit_sum_are_rejected() {
        let weights = OciWeights {
            severity: 0.4,
            ..OciWeights::STANDARD
        };
        assert!(matches!(weights.validate(), Err(OciError::InvalidConfig { .. })));
    }

    #[test]
    fn zero_denominators_score_as_zero_components() {
        let record = CountryRecord::new("ZZZ", "Nowhere");
        let components = score(&record);
        assert_eq!(components.in_need_rate_component, 0.0);
        assert_eq!(components.funding_gap_component, 0.0);
        // No one in need means no coverage, so mismatch is total.
        assert_eq!(components.coverage_mismatch_component, 100.0);
        assert_eq!(components.total_score, 18.0);
    }

    #[test]
    fn revised_requirement_backs_up_missing_appeal() {
        let record = CountryRecord {
            revised_plan_requirements: 200.0,
            funding_received: 50.0,
            ..CountryRecord::new("RRR", "Revised")
        };
        assert_eq!(DerivedMetrics::of_record(&record).funding_gap_pct, 75.0);
    }

    #[test]
    fn risk_bands() {
        assert_eq!(RiskBand::from_score(80.0), RiskBand::Critical);
        assert_eq!(RiskBand::from_score(79.99), RiskBand::High);
        assert_eq!(RiskBand::from_score(40.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(12.0).as_str(), "low");
    }
}
