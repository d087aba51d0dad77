//! Deterministic synthetic populations.
//!
//! Used by the runner when no population file is given and by the test
//! suite. Same seed and size always give the same records.
//!
//! GENERATION ORDER (per country, all draws from its own stream):
//!   1. name + iso3         (Names stream)
//!   2. head counts, money  (Countries stream)
//!   3. projection anchors  (Projections stream)
//! Projects draw only from the Projects stream, so adding projects never
//! changes the countries.

use crate::{
    country::{CountryRecord, FundingTrendPoint, Population, ProjectionPoint},
    error::{OciError, OciResult},
    name_generator::{NameGenerator, CLUSTERS},
    project::ProjectRecord,
    rng::{RngBank, SeededRng, StreamSlot},
    stats::{clamp_percent, round_to},
};

const LATEST_FUNDING_YEAR: i32 = 2024;
const TREND_YEARS: i32 = 3;
const ANCHOR_MONTHS: [u32; 3] = [6, 12, 24];
const NEGLECT_CUTOFF: f64 = 65.0;

/// Chance that a synthetic project's reach is scaled far off its cluster.
const OUTLIER_CHANCE: f64 = 0.06;

pub fn generate_countries(seed: u64, count: usize) -> OciResult<Population> {
    if count == 0 {
        return Err(OciError::InvalidConfig {
            reason: "synthetic population needs at least one country".into(),
        });
    }

    let bank = RngBank::new(seed);
    let mut names_rng = bank.for_stream(StreamSlot::Names);
    let mut rng = bank.for_stream(StreamSlot::Countries);
    let mut projections_rng = bank.for_stream(StreamSlot::Projections);
    let mut names = NameGenerator::new();

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let (name, iso3) = names.country(&mut names_rng).ok_or_else(|| OciError::InvalidConfig {
            reason: format!("cannot issue {count} distinct three-letter codes"),
        })?;
        let mut record = synthetic_country(&mut rng, iso3, name);
        record.future_projections = synthetic_projections(&mut projections_rng, &record);
        records.push(record);
    }

    log::debug!("Generated {count} synthetic countries (seed {seed})");
    Population::new(records)
}

fn synthetic_country(rng: &mut SeededRng, iso3: String, name: String) -> CountryRecord {
    let population = rng.pareto(800_000.0, 1.4).min(120_000_000.0).round();
    let in_need = (population * rng.uniform(0.05, 0.6)).round();
    let targeted = (in_need * rng.uniform(0.5, 0.95)).round();
    let reached = (targeted * rng.uniform(0.3, 1.0)).round();
    let affected = (in_need * rng.uniform(1.0, 1.4)).round();

    let per_capita_need = rng.uniform(40.0, 220.0);
    let funding_required = (in_need * per_capita_need).round();
    let percent_funded = round_to(rng.uniform(5.0, 90.0), 2);
    let funding_received = (funding_required * percent_funded / 100.0).round();

    let severity_score = round_to(rng.uniform(30.0, 95.0), 2);
    let ensemble_score =
        round_to(clamp_percent(severity_score * 0.6 + (100.0 - percent_funded) * 0.4), 2);

    let donor_diversity_score = rng
        .chance(0.7)
        .then(|| round_to(rng.uniform(15.0, 90.0), 2));
    let internal_funding_usd = rng
        .chance(0.5)
        .then(|| (funding_received * rng.uniform(0.0, 0.3)).round());
    let global_cluster_gap_pct = rng
        .chance(0.6)
        .then(|| round_to(rng.uniform(10.0, 80.0), 2));

    let funding_trend = (0..TREND_YEARS)
        .map(|offset| {
            let req_usd = (funding_required * rng.uniform(0.8, 1.2)).round();
            FundingTrendPoint {
                year: LATEST_FUNDING_YEAR - (TREND_YEARS - 1) + offset,
                req_usd,
                funded_usd: (req_usd * rng.uniform(0.05, 0.9)).round(),
            }
        })
        .collect();

    CountryRecord {
        iso3,
        country: name,
        population,
        in_need,
        targeted,
        affected,
        reached,
        funding_required,
        funding_received,
        revised_plan_requirements: 0.0,
        percent_funded,
        latest_funding_year: LATEST_FUNDING_YEAR,
        severity_score,
        overlooked_score: None,
        ensemble_score: Some(ensemble_score),
        neglect_score: None,
        donor_diversity_score,
        internal_funding_usd,
        global_cluster_gap_pct,
        future_projections: Vec::new(),
        funding_trend,
    }
}

/// A random walk from the baseline; about a quarter of countries get no
/// anchors at all and exercise the structural fallback.
fn synthetic_projections(rng: &mut SeededRng, record: &CountryRecord) -> Vec<ProjectionPoint> {
    if rng.chance(0.25) {
        return Vec::new();
    }
    let mut score = record.baseline_neglect();
    ANCHOR_MONTHS
        .iter()
        .map(|&months_ahead| {
            score = clamp_percent(score + rng.uniform(-6.0, 6.0));
            let neglect_flag_pred = rng.chance(0.8).then_some(score >= NEGLECT_CUTOFF);
            ProjectionPoint {
                months_ahead,
                score: round_to(score, 2),
                neglect_flag_pred,
            }
        })
        .collect()
}

/// `per_country` projects per country, spread over the humanitarian
/// clusters. Ids are `<ISO3>-P<nnn>`.
pub fn generate_projects(
    seed: u64,
    population: &Population,
    per_country: usize,
) -> Vec<ProjectRecord> {
    let mut rng = RngBank::new(seed).for_stream(StreamSlot::Projects);
    let mut projects = Vec::with_capacity(population.len() * per_country);

    for record in population.iter() {
        for index in 0..per_country {
            let cluster = CLUSTERS[index % CLUSTERS.len()];
            let budget_usd = rng.pareto(150_000.0, 1.6).min(60_000_000.0).round();
            let mut reach_per_dollar = rng.uniform(0.004, 0.04);
            if rng.chance(OUTLIER_CHANCE) {
                reach_per_dollar *= if rng.chance(0.5) { 25.0 } else { 0.04 };
            }
            let people_targeted = (budget_usd * reach_per_dollar).round();
            let funding_pct = round_to(rng.uniform(0.0, 100.0), 2);

            let mut project = ProjectRecord::new(
                format!("{}-P{:03}", record.iso3, index + 1),
                cluster,
                budget_usd,
                people_targeted,
                funding_pct,
            );
            project.iso3 = record.iso3.clone();
            project.name = NameGenerator::project_name(&mut rng, &record.country, cluster);
            projects.push(project);
        }
    }

    log::debug!("Generated {} synthetic projects (seed {seed})", projects.len());
    projects
}
