//! Quarter-by-metric heatmap of the selected country's trajectory.
//!
//! One row per tracked metric, one cell per quarter. Every cell is read
//! against the first quarter:
//!   normalized  min-max position of the value within the row
//!   intensity   0.2 + 0.8 * |value - first| / max |value - first|
//!   status      improve / worsen past a 0.05 deadband, else flat,
//!               in the metric's own direction (`higher_is_better`)

use crate::{
    snapshot::{QuarterSnapshot, SelectedCountryQuarter},
    stats::{clamp01, round_to},
};
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;
const STATUS_DEADBAND: f64 = 0.05;
const MIN_INTENSITY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    Oci,
    ProjectedNeglect,
    PercentFunded,
    FundingReceived,
    Rank,
}

impl HeatmapMetric {
    pub const ALL: [HeatmapMetric; 5] = [
        HeatmapMetric::Oci,
        HeatmapMetric::ProjectedNeglect,
        HeatmapMetric::PercentFunded,
        HeatmapMetric::FundingReceived,
        HeatmapMetric::Rank,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HeatmapMetric::Oci => "OCI",
            HeatmapMetric::ProjectedNeglect => "Projected neglect",
            HeatmapMetric::PercentFunded => "Funding coverage",
            HeatmapMetric::FundingReceived => "Funding received",
            HeatmapMetric::Rank => "Global rank",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, HeatmapMetric::PercentFunded | HeatmapMetric::FundingReceived)
    }

    fn value(&self, selected: &SelectedCountryQuarter) -> f64 {
        match self {
            HeatmapMetric::Oci => selected.oci,
            HeatmapMetric::ProjectedNeglect => selected.projected_neglect,
            HeatmapMetric::PercentFunded => selected.percent_funded,
            HeatmapMetric::FundingReceived => selected.funding_received,
            HeatmapMetric::Rank => selected.rank as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Improve,
    Worsen,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub quarter_label: String,
    pub value: f64,
    pub normalized: f64,
    pub intensity: f64,
    pub status: CellStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub metric_key: HeatmapMetric,
    pub metric_label: String,
    pub higher_is_better: bool,
    pub cells: Vec<HeatmapCell>,
}

/// One row per metric; empty when there are no quarters.
pub fn heatmap_rows(quarters: &[QuarterSnapshot]) -> Vec<HeatmapRow> {
    if quarters.is_empty() {
        return Vec::new();
    }
    HeatmapMetric::ALL
        .iter()
        .map(|metric| heatmap_row(*metric, quarters))
        .collect()
}

fn heatmap_row(metric: HeatmapMetric, quarters: &[QuarterSnapshot]) -> HeatmapRow {
    let values: Vec<f64> = quarters
        .iter()
        .map(|q| metric.value(&q.selected_country))
        .collect();
    let first = values.first().copied().unwrap_or(0.0);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = (max - min).max(EPSILON);
    let delta_range = values
        .iter()
        .map(|v| (v - first).abs())
        .fold(EPSILON, f64::max);

    let cells = quarters
        .iter()
        .zip(&values)
        .map(|(quarter, &value)| {
            let delta = value - first;
            let signal = if metric.higher_is_better() { delta } else { -delta };
            let status = if signal > STATUS_DEADBAND {
                CellStatus::Improve
            } else if signal < -STATUS_DEADBAND {
                CellStatus::Worsen
            } else {
                CellStatus::Flat
            };
            HeatmapCell {
                quarter_label: quarter.quarter_label.clone(),
                value: round_to(value, 2),
                normalized: round_to(clamp01((value - min) / range), 4),
                intensity: round_to(
                    clamp01(MIN_INTENSITY + delta.abs() / delta_range * (1.0 - MIN_INTENSITY)),
                    4,
                ),
                status,
            }
        })
        .collect();

    HeatmapRow {
        metric_key: metric,
        metric_label: metric.label().to_string(),
        higher_is_better: metric.higher_is_better(),
        cells,
    }
}
