//! Resolved-metrics builder.
//!
//! Upstream rows arrive loosely typed: camelCase keys, nullable numbers,
//! projection horizons given either as `monthsAhead` or as a step label,
//! scores nested under model names. This module resolves them once into
//! the fixed `CountryRecord` / `ProjectRecord` schema. The engine never
//! sees a raw row.
//!
//! FIELD RESOLUTION:
//!   iso3                 trimmed, upper-cased
//!   head counts, USD     missing or non-finite → 0
//!   severity_score       missing → 0 (clamped later, at use)
//!   baseline scores      kept optional; precedence is applied by
//!                        `CountryRecord::baseline_neglect`
//!   projection horizon   `monthsAhead` when > 0, else inferred from
//!                        `step` (`q<n>` → 3n, `<n>mo` → n), else dropped
//!   projection score     ensembleScore → neglectScore → lgbm, else dropped
//!   funding trend        rows with any non-finite field dropped

use crate::{
    country::{normalize_iso3, CountryRecord, FundingTrendPoint, Population, ProjectionPoint},
    error::OciResult,
    project::{budget_to_reach, ProjectRecord},
    schedule::infer_months_ahead,
    types::MonthsAhead,
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProjectionScores {
    pub ensemble_score: Option<f64>,
    pub neglect_score: Option<f64>,
    pub lgbm: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProjection {
    pub step: Option<String>,
    pub months_ahead: Option<f64>,
    pub neglect_flag_pred: Option<bool>,
    pub scores: Option<RawProjectionScores>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFundingTrend {
    pub year: Option<i32>,
    pub req_usd: Option<f64>,
    pub funded_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCountryMetrics {
    pub iso3: String,
    pub country: String,
    pub population: Option<f64>,
    pub in_need: Option<f64>,
    pub targeted: Option<f64>,
    pub affected: Option<f64>,
    pub reached: Option<f64>,
    pub funding_required: Option<f64>,
    pub funding_received: Option<f64>,
    pub percent_funded: Option<f64>,
    pub revised_plan_requirements: Option<f64>,
    pub latest_funding_year: Option<i32>,
    pub severity_score: Option<f64>,
    pub overlooked_score: Option<f64>,
    pub ensemble_score: Option<f64>,
    pub neglect_score: Option<f64>,
    pub donor_diversity_score: Option<f64>,
    pub internal_funding_usd: Option<f64>,
    pub global_cluster_gap_pct: Option<f64>,
    pub future_projections: Vec<RawProjection>,
    pub funding_trend: Vec<RawFundingTrend>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProject {
    pub project_id: String,
    pub name: String,
    pub iso3: String,
    pub cluster_name: String,
    pub budget_usd: Option<f64>,
    pub people_targeted: Option<f64>,
    pub funding_pct: Option<f64>,
}

fn number(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn resolve_projection(raw: &RawProjection) -> Option<ProjectionPoint> {
    let months_ahead: MonthsAhead = match raw.months_ahead.filter(|m| m.is_finite() && *m > 0.0) {
        Some(m) => m.round() as MonthsAhead,
        None => raw.step.as_deref().and_then(infer_months_ahead)?,
    };
    if months_ahead == 0 {
        return None;
    }

    let scores = raw.scores.as_ref()?;
    let score = finite(scores.ensemble_score)
        .or(finite(scores.neglect_score))
        .or(finite(scores.lgbm))?;

    Some(ProjectionPoint {
        months_ahead,
        score,
        neglect_flag_pred: raw.neglect_flag_pred,
    })
}

fn resolve_trend(raw: &RawFundingTrend) -> Option<FundingTrendPoint> {
    Some(FundingTrendPoint {
        year: raw.year?,
        req_usd: finite(raw.req_usd)?,
        funded_usd: finite(raw.funded_usd)?,
    })
}

pub fn resolve_country(raw: &RawCountryMetrics) -> CountryRecord {
    let dropped = raw
        .future_projections
        .iter()
        .filter(|p| resolve_projection(p).is_none())
        .count();
    if dropped > 0 {
        log::warn!("{}: dropped {dropped} unusable projection rows", raw.iso3);
    }

    CountryRecord {
        iso3: normalize_iso3(&raw.iso3),
        country: raw.country.trim().to_string(),
        population: number(raw.population),
        in_need: number(raw.in_need),
        targeted: number(raw.targeted),
        affected: number(raw.affected),
        reached: number(raw.reached),
        funding_required: number(raw.funding_required),
        funding_received: number(raw.funding_received),
        revised_plan_requirements: number(raw.revised_plan_requirements),
        percent_funded: number(raw.percent_funded),
        latest_funding_year: raw.latest_funding_year.unwrap_or(0),
        severity_score: number(raw.severity_score),
        overlooked_score: finite(raw.overlooked_score),
        ensemble_score: finite(raw.ensemble_score),
        neglect_score: finite(raw.neglect_score),
        donor_diversity_score: finite(raw.donor_diversity_score),
        internal_funding_usd: finite(raw.internal_funding_usd),
        global_cluster_gap_pct: finite(raw.global_cluster_gap_pct),
        future_projections: raw
            .future_projections
            .iter()
            .filter_map(resolve_projection)
            .collect(),
        funding_trend: raw.funding_trend.iter().filter_map(resolve_trend).collect(),
    }
}

pub fn resolve_population(raws: &[RawCountryMetrics]) -> OciResult<Population> {
    Population::new(raws.iter().map(resolve_country).collect())
}

/// Parse a JSON array of upstream country rows into a population.
pub fn population_from_json(json: &str) -> OciResult<Population> {
    let raws: Vec<RawCountryMetrics> = serde_json::from_str(json)?;
    resolve_population(&raws)
}

pub fn resolve_project(raw: &RawProject) -> ProjectRecord {
    let budget_usd = number(raw.budget_usd);
    let people_targeted = number(raw.people_targeted);
    ProjectRecord {
        project_id: raw.project_id.trim().to_string(),
        name: raw.name.clone(),
        iso3: normalize_iso3(&raw.iso3),
        cluster_name: raw.cluster_name.trim().to_string(),
        budget_usd,
        people_targeted,
        funding_pct: number(raw.funding_pct),
        bbr: budget_to_reach(people_targeted, budget_usd),
        ..ProjectRecord::default()
    }
}

/// Parse a JSON array of upstream project rows.
pub fn projects_from_json(json: &str) -> OciResult<Vec<ProjectRecord>> {
    let raws: Vec<RawProject> = serde_json::from_str(json)?;
    Ok(raws.iter().map(resolve_project).collect())
}
