//! Quarterly projection engine: projected neglect at a horizon.
//!
//! PIPELINE (fixed order):
//!   1. Regression: interpolate / extrapolate the record's projection
//!      anchors. No anchors → structural drift fallback.
//!   2. Funding response: when the scenario adds funding, subtract a
//!      diminishing-returns reduction. No added funding → unchanged.
//!   3. Classifier gating: the nearest anchor carrying a neglect flag
//!      floors the score at NEGLECT_THRESHOLD (flag true) or caps it just
//!      below (flag false). The regression keeps the magnitude, the
//!      classifier decides the side of the threshold.
//!
//! Every branch is total: missing data lands on a documented fallback,
//! never on an error.

use crate::{
    country::CountryRecord,
    oci::DerivedMetrics,
    schedule::MONTHS_PER_QUARTER,
    stats::{clamp_percent, clamp_range},
    types::MonthsAhead,
};

/// Score at or above this classifies a country as neglected.
pub const NEGLECT_THRESHOLD: f64 = 65.0;

/// Ceiling applied when the classifier clears a country.
pub const CLEARED_CEILING: f64 = NEGLECT_THRESHOLD - 0.1;

const MAX_QUARTER_DRIFT: f64 = 2.2;
const MIN_QUARTER_DRIFT: f64 = 0.12;
const MAX_TREND_DRIFT: f64 = 0.32;
const TREND_WINDOW_YEARS: usize = 3;
const RESPONSE_HORIZON_MONTHS: f64 = 24.0;

/// Funding state to project under. `None` fields mean "as reported".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FundingScenario {
    pub funding_received: Option<f64>,
    pub percent_funded: Option<f64>,
}

impl FundingScenario {
    pub fn with_funding(funding_received: f64, percent_funded: f64) -> Self {
        Self {
            funding_received: Some(funding_received),
            percent_funded: Some(percent_funded),
        }
    }
}

/// A model that projects a country's neglect score forward.
///
/// The simulator is generic over this so alternative projection models
/// can be plugged in without touching ranking or impact logic.
pub trait NeglectProjector {
    /// Projected neglect in [0, 100] at `months_ahead` under `scenario`.
    fn projected_neglect(
        &self,
        record: &CountryRecord,
        months_ahead: MonthsAhead,
        scenario: &FundingScenario,
    ) -> f64;

    /// Binary classifier verdict at this horizon, if any.
    fn neglect_flag(&self, record: &CountryRecord, months_ahead: MonthsAhead) -> Option<bool>;
}

/// Regression anchors + funding response + classifier gating.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionProjector;

impl NeglectProjector for RegressionProjector {
    fn projected_neglect(
        &self,
        record: &CountryRecord,
        months_ahead: MonthsAhead,
        scenario: &FundingScenario,
    ) -> f64 {
        projected_neglect(record, months_ahead, scenario)
    }

    fn neglect_flag(&self, record: &CountryRecord, months_ahead: MonthsAhead) -> Option<bool> {
        classifier_flag(record, months_ahead)
    }
}

pub fn projected_neglect(
    record: &CountryRecord,
    months_ahead: MonthsAhead,
    scenario: &FundingScenario,
) -> f64 {
    let raw = regression_neglect_at_months(record, months_ahead);
    let adjusted = funding_adjusted_neglect(record, months_ahead, raw, scenario);
    match classifier_flag(record, months_ahead) {
        Some(true) => clamp_percent(adjusted.max(NEGLECT_THRESHOLD)),
        Some(false) => clamp_percent(adjusted.min(CLEARED_CEILING)),
        None => adjusted,
    }
}

/// Flag of the flagged anchor nearest to `months_ahead`. On equal
/// distance the shorter horizon wins.
pub fn classifier_flag(record: &CountryRecord, months_ahead: MonthsAhead) -> Option<bool> {
    let target = i64::from(months_ahead);
    let mut best: Option<(i64, bool)> = None;
    for point in record.projection_anchors() {
        let Some(flag) = point.neglect_flag_pred else {
            continue;
        };
        let distance = (i64::from(point.months_ahead) - target).abs();
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, flag));
        }
    }
    best.map(|(_, flag)| flag)
}

/// Pure regression path, no funding response and no classifier.
pub fn regression_neglect_at_months(record: &CountryRecord, months_ahead: MonthsAhead) -> f64 {
    let base = record.baseline_neglect();
    if months_ahead == 0 {
        return base;
    }

    let points = record.projection_anchors();
    let Some(first) = points.first().copied() else {
        return fallback_projected_neglect(record, months_ahead);
    };

    if let Some(exact) = points.iter().find(|p| p.months_ahead == months_ahead) {
        return exact.score;
    }

    let m = f64::from(months_ahead);

    if months_ahead < first.months_ahead {
        let ratio = m / f64::from(first.months_ahead.max(1));
        return clamp_percent(base + (first.score - base) * ratio);
    }

    for pair in points.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if months_ahead > prev.months_ahead && months_ahead < next.months_ahead {
            let span = f64::from((next.months_ahead - prev.months_ahead).max(1));
            let ratio = (m - f64::from(prev.months_ahead)) / span;
            return clamp_percent(prev.score + (next.score - prev.score) * ratio);
        }
    }

    // Beyond the last anchor.
    let last = points[points.len() - 1];
    let slope = if points.len() >= 2 {
        let prev = points[points.len() - 2];
        let span = f64::from((last.months_ahead - prev.months_ahead).max(1));
        (last.score - prev.score) / span
    } else {
        (last.score - base) / f64::from(last.months_ahead.max(1))
    };
    clamp_percent(last.score + slope * (m - f64::from(last.months_ahead)))
}

/// Lower `raw_neglect` in response to added funding.
///
/// reduction = (√gain_pp · 0.9 + ln(1 + share_pct) · 1.8)
///           · (0.45 + 0.55 · gap/100)
///           · (0.55 + 0.45 · min(months, 24)/24)
pub fn funding_adjusted_neglect(
    record: &CountryRecord,
    months_ahead: MonthsAhead,
    raw_neglect: f64,
    scenario: &FundingScenario,
) -> f64 {
    let base_funding = record.funding_received.max(0.0);
    let scenario_funding = scenario
        .funding_received
        .map_or(base_funding, |f| f.max(0.0));
    let base_pct = record.percent_funded_for(base_funding);
    let scenario_pct = scenario
        .percent_funded
        .map_or_else(|| record.percent_funded_for(scenario_funding), clamp_percent);

    let added_funding = (scenario_funding - base_funding).max(0.0);
    let funded_gain_pp = (scenario_pct - base_pct).max(0.0);
    if added_funding <= 0.0 && funded_gain_pp <= 0.0 {
        return raw_neglect;
    }

    let requirement = record.funding_requirement();
    let allocation_share_pct = if requirement > 0.0 {
        clamp_percent(added_funding / requirement * 100.0)
    } else {
        0.0
    };
    let gap_pct = DerivedMetrics::of_record(record).funding_gap_pct;
    let gap_responsiveness = 0.45 + 0.55 * (gap_pct / 100.0);
    let horizon_share =
        f64::from(months_ahead).min(RESPONSE_HORIZON_MONTHS) / RESPONSE_HORIZON_MONTHS;
    let horizon_responsiveness = 0.55 + 0.45 * horizon_share;

    let reduction = (funded_gain_pp.sqrt() * 0.9 + allocation_share_pct.ln_1p() * 1.8)
        * gap_responsiveness
        * horizon_responsiveness;

    clamp_percent(raw_neglect - reduction)
}

/// Projection without anchors: baseline plus a per-quarter drift.
fn fallback_projected_neglect(record: &CountryRecord, months_ahead: MonthsAhead) -> f64 {
    let quarters_ahead = f64::from(months_ahead) / f64::from(MONTHS_PER_QUARTER);
    log::trace!(
        "{}: no projection anchors, structural drift over {quarters_ahead} quarters",
        record.iso3
    );
    clamp_percent(record.baseline_neglect() + quarter_drift(record) * quarters_ahead)
}

/// Per-quarter drift in [-2.2, 2.2], never smaller than 0.12 in magnitude.
pub fn quarter_drift(record: &CountryRecord) -> f64 {
    let base = record.baseline_neglect();
    let derived = DerivedMetrics::of_record(record);

    let structural_pressure =
        clamp_percent(record.severity_score * 0.6 + derived.funding_gap_pct * 0.4);
    let convergence = (structural_pressure - base) * 0.08;
    let structural = ((derived.funding_gap_pct + record.severity_score) / 200.0 - 0.5) * 0.9;
    let unmet_need = (derived.in_need_pct - derived.coverage_pct).max(0.0) / 100.0 * 0.28;
    let trend = funding_trend_drift(record);

    let combined = clamp_range(
        convergence + structural + unmet_need + trend,
        -MAX_QUARTER_DRIFT,
        MAX_QUARTER_DRIFT,
    );
    if combined.abs() >= MIN_QUARTER_DRIFT {
        combined
    } else if combined >= 0.0 {
        MIN_QUARTER_DRIFT
    } else {
        -MIN_QUARTER_DRIFT
    }
}

/// Improving historical coverage relieves drift, worsening adds to it.
fn funding_trend_drift(record: &CountryRecord) -> f64 {
    let mut valid: Vec<_> = record
        .funding_trend
        .iter()
        .filter(|p| p.req_usd.is_finite() && p.funded_usd.is_finite())
        .copied()
        .collect();
    if valid.len() < 2 {
        return 0.0;
    }
    valid.sort_by_key(|p| p.year);

    let recent = &valid[valid.len().saturating_sub(TREND_WINDOW_YEARS)..];
    let first = recent[0];
    let last = recent[recent.len() - 1];
    let delta = coverage_pct(first.req_usd, first.funded_usd)
        - coverage_pct(last.req_usd, last.funded_usd);

    clamp_range(delta / 100.0 * MAX_TREND_DRIFT, -MAX_TREND_DRIFT, MAX_TREND_DRIFT)
}

fn coverage_pct(req_usd: f64, funded_usd: f64) -> f64 {
    if req_usd <= 0.0 {
        return 0.0;
    }
    clamp_percent(funded_usd.max(0.0) / req_usd * 100.0)
}
