//! The funding allocation simulator.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Baseline: zero allocation, horizon 0, full-population ranking.
//!   2. For each of the 8 quarterly steps:
//!        a. add `allocation * progress` to the target's funding only
//!        b. recompute percent funded for every country
//!        c. project neglect per country under its scenario funding
//!        d. blend severity 55/45 with projected neglect, rescore OCI
//!        e. add the dataset adjustment (0..=16)
//!        f. re-rank the whole population, emit a QuarterSnapshot
//!   3. Diff the final quarter against the baseline: leaderboard
//!      changes, neighbour impacts, impact arrows.
//!
//! RULES:
//!   - Every quarter recomputes from the caller's records. Quarters do
//!     not read each other's output.
//!   - Caller-owned records are never mutated.
//!   - No randomness, no I/O. Same input, same output.

use crate::{
    config::EngineConfig,
    country::{normalize_iso3, CountryRecord, Population},
    error::{OciError, OciResult},
    heatmap::heatmap_rows,
    impact::{build_country_impacts, build_leaderboard_changes, ImpactLimits},
    oci::{score_inputs, OciInputs},
    outlook::ModelOutlook,
    projection::{FundingScenario, NeglectProjector, RegressionProjector, NEGLECT_THRESHOLD},
    ranking::{find, rank_rows, QuarterRow, RankedRow},
    schedule::{QuarterStep, QUARTERLY_STEPS},
    snapshot::{
        metric_overrides, top_overlooked, BaseSnapshot, LeaderboardEntry, QuarterSnapshot,
        ScenarioSnapshot, SelectedCountryQuarter, SimulationResult,
    },
    stats::{clamp_percent, round_to},
    types::{Iso3, MonthsAhead},
};

const SEVERITY_BLEND: f64 = 0.55;
const NEGLECT_BLEND: f64 = 0.45;
const MAX_DATASET_ADJUSTMENT: f64 = 16.0;
const DEFAULT_DONOR_DIVERSITY: f64 = 50.0;

pub struct Simulator<P: NeglectProjector = RegressionProjector> {
    config: EngineConfig,
    projector: P,
}

impl Simulator<RegressionProjector> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_projector(config, RegressionProjector)
    }
}

impl Default for Simulator<RegressionProjector> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<P: NeglectProjector> Simulator<P> {
    pub fn with_projector(config: EngineConfig, projector: P) -> Self {
        Self { config, projector }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current-funding ranking every scenario is measured against: OCI
    /// plus dataset adjustment, no allocation applied.
    pub fn baseline_ranking(&self, population: &Population) -> Vec<RankedRow> {
        rank_rows(self.quarter_rows(population, "", 0.0, 0.0, 0))
    }

    /// Top of the baseline ranking, capped at `top_overlooked_limit`.
    pub fn baseline_board(&self, population: &Population) -> Vec<LeaderboardEntry> {
        top_overlooked(
            &self.baseline_ranking(population),
            self.config.top_overlooked_limit,
        )
    }

    /// Run the 8-quarter simulation for `iso3` receiving `allocation_usd`.
    ///
    /// Fails with `InvalidTarget` when `iso3` is not three ASCII letters
    /// and `TargetNotFound` when it is not in `population`. Negative or
    /// non-finite allocations are treated as zero.
    pub fn simulate(
        &self,
        population: &Population,
        iso3: &str,
        allocation_usd: f64,
    ) -> OciResult<SimulationResult> {
        let selected = validate_target(iso3)?;
        if !population.contains(&selected) {
            return Err(OciError::TargetNotFound { iso3: selected });
        }
        let allocation = sanitize_allocation(allocation_usd);
        log::info!(
            "Simulating {selected}: allocation {allocation:.0} USD over {} quarters, {} countries",
            QUARTERLY_STEPS.len(),
            population.len()
        );

        let base_ranked = self.baseline_ranking(population);
        let base_country = find(&base_ranked, &selected)
            .ok_or_else(|| OciError::TargetNotFound { iso3: selected.clone() })?
            .clone();

        let mut quarters = Vec::with_capacity(QUARTERLY_STEPS.len());
        let mut final_ranked: Vec<RankedRow> = Vec::new();
        for step in &QUARTERLY_STEPS {
            let ranked = rank_rows(self.quarter_rows(
                population,
                &selected,
                allocation,
                step.progress(),
                step.months_ahead,
            ));
            let snapshot =
                self.quarter_snapshot(population, &selected, step, &ranked, &base_country)?;
            log::debug!(
                "{} {}: rank {} oci {:.2} projected neglect {:.2}",
                step.quarter_label,
                selected,
                snapshot.selected_country.rank,
                snapshot.selected_country.oci,
                snapshot.selected_country.projected_neglect
            );
            quarters.push(snapshot);
            final_ranked = ranked;
        }

        let final_quarter = quarters
            .last()
            .ok_or_else(|| OciError::Other(anyhow::anyhow!("quarterly schedule is empty")))?;
        let scenario = &final_quarter.selected_country;

        let leaderboard_changes = build_leaderboard_changes(
            &selected,
            &base_ranked,
            &final_ranked,
            self.config.leaderboard_limit,
        );
        let (country_impacts, impact_arrows) = build_country_impacts(
            &selected,
            &base_ranked,
            &final_ranked,
            &ImpactLimits {
                neighbour_radius: self.config.neighbour_radius,
                mover_cap: self.config.mover_cap,
                impact_cap: self.config.impact_cap,
            },
        );

        let base_oci = base_country.row.overlooked_score;
        let result = SimulationResult {
            iso3: selected.clone(),
            allocation_usd: allocation,
            base: BaseSnapshot {
                rank: base_country.rank,
                oci: round_to(base_oci, 2),
                funding_received: base_country.row.funding_received.round(),
                percent_funded: round_to(base_country.row.percent_funded, 2),
            },
            scenario: ScenarioSnapshot {
                rank: scenario.rank,
                oci: scenario.oci,
                funding_received: scenario.funding_received,
                percent_funded: scenario.percent_funded,
                projected_neglect: scenario.projected_neglect,
            },
            rank_delta: base_country.rank as i64 - scenario.rank as i64,
            oci_delta: round_to(base_oci - scenario.oci, 2),
            overall_score_delta: round_to(scenario.oci - base_oci, 2),
            top_overlooked_after: final_quarter.top_overlooked.clone(),
            leaderboard_changes,
            country_impacts,
            impact_arrows,
            outlook: ModelOutlook::from_quarters(&quarters, NEGLECT_THRESHOLD),
            heatmap: heatmap_rows(&quarters),
            quarters,
        };

        log::info!(
            "{selected}: rank {} -> {}, oci {:.2} -> {:.2}",
            result.base.rank,
            result.scenario.rank,
            result.base.oci,
            result.scenario.oci
        );
        Ok(result)
    }

    fn quarter_snapshot(
        &self,
        population: &Population,
        selected: &str,
        step: &QuarterStep,
        ranked: &[RankedRow],
        base_country: &RankedRow,
    ) -> OciResult<QuarterSnapshot> {
        let current = find(ranked, selected).ok_or_else(|| OciError::TargetNotFound {
            iso3: selected.to_string(),
        })?;
        let neglect_flag_pred = population
            .get(selected)
            .and_then(|record| self.projector.neglect_flag(record, step.months_ahead));

        Ok(QuarterSnapshot {
            quarter_label: step.quarter_label.to_string(),
            quarter_index: step.quarter_index,
            months_ahead: step.months_ahead,
            selected_country: SelectedCountryQuarter {
                rank: current.rank,
                oci: round_to(current.row.overlooked_score, 2),
                overall_score_delta: round_to(
                    current.row.overlooked_score - base_country.row.overlooked_score,
                    2,
                ),
                funding_received: current.row.funding_received.round(),
                percent_funded: round_to(current.row.percent_funded, 2),
                projected_neglect: round_to(current.row.projected_neglect, 2),
                neglect_flag_pred,
            },
            top_overlooked: top_overlooked(ranked, self.config.top_overlooked_limit),
            metrics_overrides: metric_overrides(ranked),
        })
    }

    /// Recompute every country for one quarter, in population order.
    fn quarter_rows(
        &self,
        population: &Population,
        selected: &str,
        allocation_usd: f64,
        progress: f64,
        months_ahead: MonthsAhead,
    ) -> Vec<QuarterRow> {
        let applied = allocation_usd * progress;
        population
            .iter()
            .map(|record| {
                let extra = if record.iso3 == selected { applied } else { 0.0 };
                self.quarter_row(record, extra, months_ahead)
            })
            .collect()
    }

    fn quarter_row(
        &self,
        record: &CountryRecord,
        extra_funding: f64,
        months_ahead: MonthsAhead,
    ) -> QuarterRow {
        let funding_received = record.funding_received + extra_funding;
        let percent_funded = record.percent_funded_for(funding_received);
        let projected_neglect = self.projector.projected_neglect(
            record,
            months_ahead,
            &FundingScenario::with_funding(funding_received, percent_funded),
        );
        let severity_score = clamp_percent(
            record.severity_score * SEVERITY_BLEND + projected_neglect * NEGLECT_BLEND,
        );

        let oci = score_inputs(
            &OciInputs {
                severity_score,
                funding_received,
                ..OciInputs::from(record)
            },
            &self.config.oci_weights,
        )
        .total_score;

        QuarterRow {
            iso3: record.iso3.clone(),
            country: record.country.clone(),
            overlooked_score: clamp_percent(oci + dataset_adjustment(record)),
            severity_score,
            funding_received,
            percent_funded,
            projected_neglect,
        }
    }
}

/// Run a simulation with the default configuration and projector.
pub fn simulate(
    population: &Population,
    iso3: &str,
    allocation_usd: f64,
) -> OciResult<SimulationResult> {
    Simulator::<RegressionProjector>::default().simulate(population, iso3, allocation_usd)
}

/// Trim and upper-case `iso3`; reject anything but three ASCII letters.
pub fn validate_target(iso3: &str) -> OciResult<Iso3> {
    let normalized = normalize_iso3(iso3);
    if normalized.len() != 3 || !normalized.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(OciError::InvalidTarget {
            iso3: iso3.to_string(),
        });
    }
    Ok(normalized)
}

fn sanitize_allocation(allocation_usd: f64) -> f64 {
    if allocation_usd.is_finite() {
        allocation_usd.max(0.0)
    } else {
        0.0
    }
}

/// Score separation from upstream dataset signals, in [0, 16].
///
/// Low donor diversity, a high internal-funding share and a wide global
/// cluster gap all push a country further up the board.
pub fn dataset_adjustment(record: &CountryRecord) -> f64 {
    let donor_diversity =
        clamp_percent(record.donor_diversity_score.unwrap_or(DEFAULT_DONOR_DIVERSITY));
    let donor_risk = (100.0 - donor_diversity) * 0.08;

    let funding_baseline = record.funding_received.max(1.0);
    let internal_share_pct =
        clamp_percent(record.internal_funding_usd.unwrap_or(0.0) / funding_baseline * 100.0);
    let internal_pressure = internal_share_pct * 0.03;

    let cluster_gap_pressure = clamp_percent(record.global_cluster_gap_pct.unwrap_or(0.0)) * 0.05;

    round_to(
        (donor_risk + internal_pressure + cluster_gap_pressure).clamp(0.0, MAX_DATASET_ADJUSTMENT),
        2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_validation() {
        assert_eq!(validate_target(" aaa ").unwrap(), "AAA");
        assert!(matches!(validate_target("AA"), Err(OciError::InvalidTarget { .. })));
        assert!(matches!(validate_target("A1B"), Err(OciError::InvalidTarget { .. })));
        assert!(matches!(validate_target(""), Err(OciError::InvalidTarget { .. })));
    }

    #[test]
    fn dataset_adjustment_defaults_and_bounds() {
        // Only the default donor diversity contributes: (100-50)*0.08.
        let record = CountryRecord::new("AAA", "Aland");
        assert_eq!(dataset_adjustment(&record), 4.0);

        let extreme = CountryRecord {
            donor_diversity_score: Some(0.0),
            internal_funding_usd: Some(1e9),
            global_cluster_gap_pct: Some(100.0),
            funding_received: 1.0,
            ..CountryRecord::new("BBB", "Borland")
        };
        assert_eq!(dataset_adjustment(&extreme), MAX_DATASET_ADJUSTMENT);
    }

    #[test]
    fn baseline_board_ranks_adjusted_scores() {
        // Equal raw inputs; the lower donor diversity earns the larger adjustment.
        let narrow = CountryRecord {
            donor_diversity_score: Some(0.0),
            ..CountryRecord::new("NAR", "Narrowland")
        };
        let broad = CountryRecord {
            donor_diversity_score: Some(100.0),
            ..CountryRecord::new("BRO", "Broadland")
        };
        let population = Population::new(vec![broad, narrow]).unwrap();
        let simulator = Simulator::<RegressionProjector>::default();

        let board = simulator.baseline_board(&population);
        let order: Vec<&str> = board.iter().map(|e| e.iso3.as_str()).collect();
        assert_eq!(order, vec!["NAR", "BRO"]);

        let result = simulator.simulate(&population, "BRO", 0.0).unwrap();
        assert_eq!(result.base.rank, board[1].rank, "scenario base uses the same board");
    }

    #[test]
    fn bad_allocations_collapse_to_zero() {
        assert_eq!(sanitize_allocation(-5.0), 0.0);
        assert_eq!(sanitize_allocation(f64::NAN), 0.0);
        assert_eq!(sanitize_allocation(12.5), 12.5);
    }
}
