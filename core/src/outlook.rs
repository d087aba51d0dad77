//! Model outlook: a compact read of the selected country's projected
//! neglect trajectory across the simulated quarters.

use crate::{snapshot::QuarterSnapshot, stats::round_to};
use serde::{Deserialize, Serialize};

const TREND_DEADBAND: f64 = 1.0;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonRiskLevel {
    High,
    Elevated,
    Watch,
    Contained,
    Unknown,
}

impl HorizonRiskLevel {
    pub fn from_projected_neglect(projected_neglect: Option<f64>) -> Self {
        match projected_neglect {
            Some(v) if v.is_finite() && v >= 75.0 => HorizonRiskLevel::High,
            Some(v) if v.is_finite() && v >= 60.0 => HorizonRiskLevel::Elevated,
            Some(v) if v.is_finite() && v >= 45.0 => HorizonRiskLevel::Watch,
            Some(v) if v.is_finite() => HorizonRiskLevel::Contained,
            _ => HorizonRiskLevel::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutlook {
    pub trend: Trend,
    pub flagged_quarters: usize,
    pub cleared_quarters: usize,
    pub unknown_quarters: usize,
    pub first_below_threshold_quarter: Option<String>,
    pub peak_risk_quarter: Option<String>,
    pub horizon_risk_level: HorizonRiskLevel,
    pub projected_improvement_pct: f64,
    pub start_projected_neglect: Option<f64>,
    pub horizon_projected_neglect: Option<f64>,
}

impl ModelOutlook {
    pub fn from_quarters(quarters: &[QuarterSnapshot], neglect_threshold: f64) -> Self {
        let series: Vec<f64> = quarters
            .iter()
            .map(|q| q.selected_country.projected_neglect)
            .collect();
        let start = series.first().copied();
        let horizon = series.last().copied();

        let trend = match (start, horizon) {
            (Some(s), Some(h)) if h - s <= -TREND_DEADBAND => Trend::Improving,
            (Some(s), Some(h)) if h - s >= TREND_DEADBAND => Trend::Worsening,
            _ => Trend::Stable,
        };

        let flagged = quarters
            .iter()
            .filter(|q| q.selected_country.neglect_flag_pred == Some(true))
            .count();
        let cleared = quarters
            .iter()
            .filter(|q| q.selected_country.neglect_flag_pred == Some(false))
            .count();

        let first_below_threshold_quarter = quarters
            .iter()
            .find(|q| q.selected_country.projected_neglect < neglect_threshold)
            .map(|q| q.quarter_label.clone());

        // Earliest quarter wins a tie for the peak.
        let peak_risk_quarter = quarters
            .iter()
            .fold(None::<&QuarterSnapshot>, |peak, q| match peak {
                Some(p)
                    if q.selected_country.projected_neglect
                        <= p.selected_country.projected_neglect =>
                {
                    Some(p)
                }
                _ => Some(q),
            })
            .map(|q| q.quarter_label.clone());

        let projected_improvement_pct = match (start, horizon) {
            (Some(s), Some(h)) if s.is_finite() && s > EPSILON => round_to((s - h) / s * 100.0, 1),
            _ => 0.0,
        };

        Self {
            trend,
            flagged_quarters: flagged,
            cleared_quarters: cleared,
            unknown_quarters: quarters.len().saturating_sub(flagged + cleared),
            first_below_threshold_quarter,
            peak_risk_quarter,
            horizon_risk_level: HorizonRiskLevel::from_projected_neglect(horizon),
            projected_improvement_pct,
            start_projected_neglect: start,
            horizon_projected_neglect: horizon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SelectedCountryQuarter;

    fn quarter(label: &str, projected_neglect: f64, flag: Option<bool>) -> QuarterSnapshot {
        QuarterSnapshot {
            quarter_label: label.into(),
            quarter_index: 0,
            months_ahead: 0,
            selected_country: SelectedCountryQuarter {
                rank: 1,
                oci: 0.0,
                overall_score_delta: 0.0,
                funding_received: 0.0,
                percent_funded: 0.0,
                projected_neglect,
                neglect_flag_pred: flag,
            },
            top_overlooked: Vec::new(),
            metrics_overrides: Vec::new(),
        }
    }

    #[test]
    fn empty_trajectory_is_stable_and_unknown() {
        let outlook = ModelOutlook::from_quarters(&[], 65.0);
        assert_eq!(outlook.trend, Trend::Stable);
        assert_eq!(outlook.horizon_risk_level, HorizonRiskLevel::Unknown);
        assert_eq!(outlook.peak_risk_quarter, None);
        assert_eq!(outlook.projected_improvement_pct, 0.0);
    }

    #[test]
    fn falling_trajectory_reads_as_improving() {
        let quarters = vec![
            quarter("Q+1", 80.0, Some(true)),
            quarter("Q+2", 82.0, Some(true)),
            quarter("Q+3", 70.0, None),
            quarter("Q+4", 60.0, Some(false)),
        ];
        let outlook = ModelOutlook::from_quarters(&quarters, 65.0);
        assert_eq!(outlook.trend, Trend::Improving);
        assert_eq!(outlook.flagged_quarters, 2);
        assert_eq!(outlook.cleared_quarters, 1);
        assert_eq!(outlook.unknown_quarters, 1);
        assert_eq!(outlook.first_below_threshold_quarter.as_deref(), Some("Q+4"));
        assert_eq!(outlook.peak_risk_quarter.as_deref(), Some("Q+2"));
        assert_eq!(outlook.horizon_risk_level, HorizonRiskLevel::Elevated);
        assert_eq!(outlook.projected_improvement_pct, 25.0);
    }
}
