//! Simulation output: per-quarter snapshots and the aggregate result.
//!
//! Produced only by the simulator, immutable afterwards. Numbers are
//! rounded for display: scores and percentages to 2 dp, USD to whole
//! dollars.

use crate::{
    heatmap::HeatmapRow,
    impact::{CountryImpact, ImpactArrow, LeaderboardChange},
    outlook::ModelOutlook,
    ranking::RankedRow,
    stats::round_to,
    types::{Iso3, MonthsAhead, Rank},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCountryQuarter {
    pub rank: Rank,
    pub oci: f64,
    /// Quarter OCI minus baseline OCI.
    pub overall_score_delta: f64,
    pub funding_received: f64,
    pub percent_funded: f64,
    pub projected_neglect: f64,
    /// Classifier verdict at this horizon; None when no anchor has one.
    pub neglect_flag_pred: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: Rank,
    pub iso3: Iso3,
    pub country: String,
    pub oci_score: f64,
}

/// One country's simulated metrics for a quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOverride {
    pub iso3: Iso3,
    pub country: String,
    pub overlooked_score: f64,
    pub severity_score: f64,
    pub funding_received: f64,
    pub percent_funded: f64,
    pub projected_neglect: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterSnapshot {
    pub quarter_label: String,
    pub quarter_index: u32,
    pub months_ahead: MonthsAhead,
    pub selected_country: SelectedCountryQuarter,
    pub top_overlooked: Vec<LeaderboardEntry>,
    /// Every country, in rank order.
    pub metrics_overrides: Vec<MetricOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSnapshot {
    pub rank: Rank,
    pub oci: f64,
    pub funding_received: f64,
    pub percent_funded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub rank: Rank,
    pub oci: f64,
    pub funding_received: f64,
    pub percent_funded: f64,
    pub projected_neglect: f64,
}

/// Aggregate result of one quarterly simulation.
///
/// SIGN CONVENTIONS (hold exactly, consumers depend on both forms):
///   rank_delta          = base.rank - scenario.rank
///   oci_delta           = base.oci  - scenario.oci
///   overall_score_delta = scenario.oci - base.oci
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub iso3: Iso3,
    pub allocation_usd: f64,
    pub base: BaseSnapshot,
    pub scenario: ScenarioSnapshot,
    pub rank_delta: i64,
    pub oci_delta: f64,
    pub overall_score_delta: f64,
    pub top_overlooked_after: Vec<LeaderboardEntry>,
    pub leaderboard_changes: Vec<LeaderboardChange>,
    pub country_impacts: Vec<CountryImpact>,
    pub impact_arrows: Vec<ImpactArrow>,
    pub quarters: Vec<QuarterSnapshot>,
    pub outlook: ModelOutlook,
    /// Selected-country metrics per quarter, read against Q+1.
    pub heatmap: Vec<HeatmapRow>,
}

pub fn top_overlooked(ranked: &[RankedRow], limit: usize) -> Vec<LeaderboardEntry> {
    ranked
        .iter()
        .take(limit)
        .map(|r| LeaderboardEntry {
            rank: r.rank,
            iso3: r.row.iso3.clone(),
            country: r.row.country.clone(),
            oci_score: round_to(r.row.overlooked_score, 2),
        })
        .collect()
}

pub fn metric_overrides(ranked: &[RankedRow]) -> Vec<MetricOverride> {
    ranked
        .iter()
        .map(|r| MetricOverride {
            iso3: r.row.iso3.clone(),
            country: r.row.country.clone(),
            overlooked_score: round_to(r.row.overlooked_score, 2),
            severity_score: round_to(r.row.severity_score, 2),
            funding_received: r.row.funding_received.round(),
            percent_funded: round_to(r.row.percent_funded, 2),
            projected_neglect: round_to(r.row.projected_neglect, 2),
        })
        .collect()
}
