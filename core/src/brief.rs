//! Country brief: one country's headline metrics and standing.

use crate::{
    country::{normalize_iso3, Population},
    error::{OciError, OciResult},
    oci::{rank_overlooked, score, DerivedMetrics, OciComponents, RiskBand},
    stats::round_to,
    types::{Iso3, Rank},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryBrief {
    pub iso3: Iso3,
    pub country: String,
    pub rank: Rank,
    pub people_in_need: f64,
    pub people_reached: f64,
    pub funding_required: f64,
    pub funding_received: f64,
    /// People in need per funded dollar; None when nothing was funded.
    pub pin_funding_ratio: Option<f64>,
    pub percent_funded: f64,
    pub in_need_rate: f64,
    pub funding_gap_pct: f64,
    pub coverage_pct: f64,
    pub severity_score: f64,
    pub latest_funding_year: i32,
    pub oci: OciComponents,
    pub risk_band: RiskBand,
}

pub fn country_brief(population: &Population, iso3: &str) -> OciResult<CountryBrief> {
    let iso3 = normalize_iso3(iso3);
    let record = population
        .get(&iso3)
        .ok_or_else(|| OciError::TargetNotFound { iso3: iso3.clone() })?;

    let rank = rank_overlooked(population.records())
        .iter()
        .position(|r| r.iso3 == iso3)
        .map_or(0, |i| i + 1);
    let derived = DerivedMetrics::of_record(record);
    let oci = score(record);
    let pin_funding_ratio = (record.funding_received > 0.0)
        .then(|| round_to(record.in_need / record.funding_received, 4));

    Ok(CountryBrief {
        iso3: record.iso3.clone(),
        country: record.country.clone(),
        rank,
        people_in_need: record.in_need,
        people_reached: record.reached,
        funding_required: record.funding_required,
        funding_received: record.funding_received,
        pin_funding_ratio,
        percent_funded: record.percent_funded,
        in_need_rate: round_to(derived.in_need_pct, 2),
        funding_gap_pct: round_to(derived.funding_gap_pct, 2),
        coverage_pct: round_to(derived.coverage_pct, 2),
        severity_score: round_to(record.severity_score, 2),
        latest_funding_year: record.latest_funding_year,
        risk_band: RiskBand::from_score(oci.total_score),
        oci,
    })
}
