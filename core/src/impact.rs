//! Leaderboard diff and impact-arrow classification.
//!
//! Compares the baseline ranking with the final scenario ranking.
//!
//! SIGN CONVENTIONS (consumed downstream, do not flip):
//!   rank_delta          = rank_before - rank_after   (> 0: moved toward rank 1)
//!   overall_score_delta = oci_after  - oci_before    (> 0: score went up)
//!   LeaderboardChange::oci_delta has the same sign as overall_score_delta.

use crate::{
    ranking::{index_by_iso3, neighbours_within, union_preserving_order, RankedRow},
    stats::round_to,
    types::{Iso3, Rank},
};
use serde::{Deserialize, Serialize};

const SCORE_DELTA_DEADBAND: f64 = 0.15;
const SCORE_GAP_DEADBAND: f64 = 0.2;
const MIN_SCORE_WEIGHT: f64 = 0.5;
const SCORE_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
    Flat,
}

impl MoveDirection {
    pub fn from_rank_delta(rank_delta: i64) -> Self {
        match rank_delta {
            d if d > 0 => MoveDirection::Up,
            d if d < 0 => MoveDirection::Down,
            _ => MoveDirection::Flat,
        }
    }
}

/// Where a neighbour stands relative to the target, before vs after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    StillAhead,
    NewAhead,
    Overtaken,
    BehindBuffer,
    Shifted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowDirection {
    Pressure,
    Relief,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardChange {
    pub rank_before: Rank,
    pub rank_after: Rank,
    pub rank_delta: i64,
    pub iso3: Iso3,
    pub country: String,
    pub oci_before: f64,
    pub oci_after: f64,
    pub oci_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryImpact {
    pub iso3: Iso3,
    pub country: String,
    pub rank_before: Rank,
    pub rank_after: Rank,
    pub rank_delta: i64,
    pub overall_score_delta: f64,
    pub direction: MoveDirection,
    pub relation: Relation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactArrow {
    pub from_iso3: Iso3,
    pub to_iso3: Iso3,
    pub country: String,
    pub direction: ArrowDirection,
    pub relation: Relation,
    pub rank_delta: i64,
    pub overall_score_delta: f64,
    pub magnitude: f64,
}

/// Size limits for the neighbourhood and impact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactLimits {
    pub neighbour_radius: usize,
    pub mover_cap: usize,
    pub impact_cap: usize,
}

impl Default for ImpactLimits {
    fn default() -> Self {
        Self {
            neighbour_radius: 2,
            mover_cap: 6,
            impact_cap: 8,
        }
    }
}

fn rank_delta(before: Rank, after: Rank) -> i64 {
    before as i64 - after as i64
}

/// Classify a neighbour's position relative to the selected country.
pub fn classify_relation(
    selected_base_rank: Rank,
    selected_scenario_rank: Rank,
    rank_before: Rank,
    rank_after: Rank,
) -> Relation {
    let was_ahead = rank_before < selected_base_rank;
    let is_ahead = rank_after < selected_scenario_rank;

    match (was_ahead, is_ahead) {
        (true, false) => Relation::Overtaken,
        (false, true) => Relation::NewAhead,
        (true, true) => Relation::StillAhead,
        (false, false) if rank_before == rank_after => Relation::BehindBuffer,
        (false, false) => Relation::Shifted,
    }
}

/// Scenario top-`limit` plus the selected country, diffed against the
/// baseline and ordered by scenario rank.
pub fn build_leaderboard_changes(
    selected_iso3: &str,
    base_ranked: &[RankedRow],
    scenario_ranked: &[RankedRow],
    limit: usize,
) -> Vec<LeaderboardChange> {
    let limit = limit.max(1);
    let base_by_iso = index_by_iso3(base_ranked);

    let mut iso_list: Vec<Iso3> = scenario_ranked
        .iter()
        .take(limit)
        .map(|r| r.row.iso3.clone())
        .collect();
    if !iso_list.iter().any(|iso3| iso3 == selected_iso3) {
        iso_list.push(selected_iso3.to_string());
    }

    let scenario_by_iso = index_by_iso3(scenario_ranked);
    let mut changes: Vec<LeaderboardChange> = iso_list
        .iter()
        .filter_map(|iso3| {
            let scenario = scenario_by_iso.get(iso3.as_str())?;
            let base = base_by_iso.get(iso3.as_str())?;
            Some(LeaderboardChange {
                rank_before: base.rank,
                rank_after: scenario.rank,
                rank_delta: rank_delta(base.rank, scenario.rank),
                iso3: iso3.clone(),
                country: scenario.row.country.clone(),
                oci_before: round_to(base.row.overlooked_score, 2),
                oci_after: round_to(scenario.row.overlooked_score, 2),
                oci_delta: round_to(scenario.row.overlooked_score - base.row.overlooked_score, 2),
            })
        })
        .collect();
    changes.sort_by_key(|c| c.rank_after);
    changes
}

/// Impacts on the selected country's neighbourhood and the arrows that
/// visualise them. Empty when the selected country is missing from
/// either ranking.
pub fn build_country_impacts(
    selected_iso3: &str,
    base_ranked: &[RankedRow],
    scenario_ranked: &[RankedRow],
    limits: &ImpactLimits,
) -> (Vec<CountryImpact>, Vec<ImpactArrow>) {
    let base_by_iso = index_by_iso3(base_ranked);
    let scenario_by_iso = index_by_iso3(scenario_ranked);
    let (Some(selected_base), Some(selected_scenario)) = (
        base_by_iso.get(selected_iso3).copied(),
        scenario_by_iso.get(selected_iso3).copied(),
    ) else {
        return (Vec::new(), Vec::new());
    };

    let movers: Vec<Iso3> = scenario_ranked
        .iter()
        .filter(|r| r.row.iso3 != selected_iso3)
        .filter(|r| {
            base_by_iso
                .get(r.row.iso3.as_str())
                .is_some_and(|base| base.rank != r.rank)
        })
        .take(limits.mover_cap)
        .map(|r| r.row.iso3.clone())
        .collect();

    let neighbourhood = union_preserving_order([
        neighbours_within(base_ranked, selected_iso3, limits.neighbour_radius),
        neighbours_within(scenario_ranked, selected_iso3, limits.neighbour_radius),
        movers,
    ]);

    let mut impacts: Vec<CountryImpact> = neighbourhood
        .iter()
        .filter_map(|iso3| {
            let base = base_by_iso.get(iso3.as_str())?;
            let scenario = scenario_by_iso.get(iso3.as_str())?;
            let delta = rank_delta(base.rank, scenario.rank);
            Some(CountryImpact {
                iso3: iso3.clone(),
                country: scenario.row.country.clone(),
                rank_before: base.rank,
                rank_after: scenario.rank,
                rank_delta: delta,
                overall_score_delta: round_to(
                    scenario.row.overlooked_score - base.row.overlooked_score,
                    2,
                ),
                direction: MoveDirection::from_rank_delta(delta),
                relation: classify_relation(
                    selected_base.rank,
                    selected_scenario.rank,
                    base.rank,
                    scenario.rank,
                ),
            })
        })
        .collect();

    impacts.sort_by(|a, b| {
        b.rank_delta
            .abs()
            .cmp(&a.rank_delta.abs())
            .then_with(|| {
                b.overall_score_delta
                    .abs()
                    .total_cmp(&a.overall_score_delta.abs())
            })
            .then_with(|| a.rank_after.cmp(&b.rank_after))
    });
    impacts.truncate(limits.impact_cap);

    let arrows = impacts
        .iter()
        .map(|impact| {
            let direction = match (
                base_by_iso.get(impact.iso3.as_str()),
                scenario_by_iso.get(impact.iso3.as_str()),
            ) {
                (Some(&base), Some(&scenario)) => arrow_direction(
                    impact,
                    (base, scenario),
                    (selected_base, selected_scenario),
                ),
                _ => relation_fallback(impact),
            };
            ImpactArrow {
                from_iso3: selected_iso3.to_string(),
                to_iso3: impact.iso3.clone(),
                country: impact.country.clone(),
                direction,
                relation: impact.relation,
                rank_delta: impact.rank_delta,
                overall_score_delta: impact.overall_score_delta,
                magnitude: round_to(
                    impact.rank_delta.abs() as f64
                        + impact.overall_score_delta.abs().max(MIN_SCORE_WEIGHT) * SCORE_WEIGHT,
                    2,
                ),
            }
        })
        .collect();

    (impacts, arrows)
}

/// Own score change first, then movement relative to the selected
/// country (rank gap, then score gap), then the relation alone.
fn arrow_direction(
    impact: &CountryImpact,
    (base, scenario): (&RankedRow, &RankedRow),
    (selected_base, selected_scenario): (&RankedRow, &RankedRow),
) -> ArrowDirection {
    if impact.overall_score_delta > SCORE_DELTA_DEADBAND {
        return ArrowDirection::Pressure;
    }
    if impact.overall_score_delta < -SCORE_DELTA_DEADBAND {
        return ArrowDirection::Relief;
    }

    let rank_gap_before = rank_delta(base.rank, selected_base.rank);
    let rank_gap_after = rank_delta(scenario.rank, selected_scenario.rank);
    let relative_rank_gap = rank_gap_after - rank_gap_before;
    if relative_rank_gap > 0 {
        return ArrowDirection::Pressure;
    }
    if relative_rank_gap < 0 {
        return ArrowDirection::Relief;
    }

    let score_gap_before = base.row.overlooked_score - selected_base.row.overlooked_score;
    let score_gap_after = scenario.row.overlooked_score - selected_scenario.row.overlooked_score;
    let relative_score_gap = score_gap_after - score_gap_before;
    if relative_score_gap > SCORE_GAP_DEADBAND {
        return ArrowDirection::Pressure;
    }
    if relative_score_gap < -SCORE_GAP_DEADBAND {
        return ArrowDirection::Relief;
    }

    relation_fallback(impact)
}

fn relation_fallback(impact: &CountryImpact) -> ArrowDirection {
    match impact.relation {
        Relation::StillAhead | Relation::NewAhead => ArrowDirection::Pressure,
        Relation::Overtaken => ArrowDirection::Relief,
        Relation::Shifted if impact.rank_delta > 0 => ArrowDirection::Pressure,
        Relation::Shifted => ArrowDirection::Relief,
        Relation::BehindBuffer => ArrowDirection::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_table() {
        // Selected country moves from rank 3 to rank 5.
        assert_eq!(classify_relation(3, 5, 2, 6), Relation::Overtaken);
        assert_eq!(classify_relation(3, 5, 4, 4), Relation::NewAhead);
        assert_eq!(classify_relation(3, 5, 1, 1), Relation::StillAhead);
        assert_eq!(classify_relation(3, 5, 7, 7), Relation::BehindBuffer);
        assert_eq!(classify_relation(3, 5, 7, 8), Relation::Shifted);
    }

    fn board(scores: &[(&str, f64)]) -> Vec<RankedRow> {
        crate::ranking::rank_rows(
            scores
                .iter()
                .map(|&(iso3, overlooked_score)| crate::ranking::QuarterRow {
                    iso3: iso3.into(),
                    country: iso3.into(),
                    overlooked_score,
                    severity_score: 0.0,
                    funding_received: 0.0,
                    percent_funded: 0.0,
                    projected_neglect: 0.0,
                })
                .collect(),
        )
    }

    fn arrow_towards(base: &[(&str, f64)], scenario: &[(&str, f64)], iso3: &str) -> ImpactArrow {
        let limits = ImpactLimits::default();
        let (_, arrows) = build_country_impacts("SEL", &board(base), &board(scenario), &limits);
        arrows
            .into_iter()
            .find(|a| a.to_iso3 == iso3)
            .unwrap_or_else(|| panic!("no arrow towards {iso3}"))
    }

    #[test]
    fn own_score_change_decides_first() {
        let up = arrow_towards(
            &[("SEL", 50.0), ("PEE", 40.0)],
            &[("SEL", 50.0), ("PEE", 41.0)],
            "PEE",
        );
        assert_eq!(up.direction, ArrowDirection::Pressure);
        let down = arrow_towards(
            &[("SEL", 50.0), ("PEE", 40.0)],
            &[("SEL", 50.0), ("PEE", 39.0)],
            "PEE",
        );
        assert_eq!(down.direction, ArrowDirection::Relief);
    }

    #[test]
    fn relative_rank_gap_decides_when_own_score_is_flat() {
        // Peer passes the selected country without moving: the selected
        // country fell away. The relation alone would read as pressure.
        let passed = arrow_towards(
            &[("SEL", 50.0), ("PEE", 40.0)],
            &[("SEL", 30.0), ("PEE", 40.0)],
            "PEE",
        );
        assert_eq!(passed.relation, Relation::NewAhead);
        assert_eq!(passed.direction, ArrowDirection::Relief);

        // Selected country climbs past a static peer.
        let overtaken = arrow_towards(
            &[("PEE", 60.0), ("SEL", 50.0)],
            &[("SEL", 70.0), ("PEE", 60.0)],
            "PEE",
        );
        assert_eq!(overtaken.relation, Relation::Overtaken);
        assert_eq!(overtaken.direction, ArrowDirection::Pressure);
    }

    #[test]
    fn relative_score_gap_decides_when_ranks_hold() {
        let closing = arrow_towards(
            &[("PEE", 60.0), ("SEL", 50.0)],
            &[("PEE", 60.0), ("SEL", 55.0)],
            "PEE",
        );
        assert_eq!(closing.relation, Relation::StillAhead);
        assert_eq!(closing.direction, ArrowDirection::Relief);

        let behind = arrow_towards(
            &[("SEL", 60.0), ("PEE", 50.0)],
            &[("SEL", 55.0), ("PEE", 50.0)],
            "PEE",
        );
        assert_eq!(behind.relation, Relation::BehindBuffer);
        assert_eq!(behind.direction, ArrowDirection::Pressure);
    }

    #[test]
    fn relation_decides_when_nothing_moves() {
        let behind = arrow_towards(
            &[("SEL", 60.0), ("PEE", 50.0)],
            &[("SEL", 60.1), ("PEE", 50.05)],
            "PEE",
        );
        assert_eq!(behind.relation, Relation::BehindBuffer);
        assert_eq!(behind.direction, ArrowDirection::Neutral);

        let ahead = arrow_towards(
            &[("PEE", 60.0), ("SEL", 50.0)],
            &[("PEE", 60.0), ("SEL", 50.0)],
            "PEE",
        );
        assert_eq!(ahead.relation, Relation::StillAhead);
        assert_eq!(ahead.direction, ArrowDirection::Pressure);
    }

    /// Thirteen peers that swap order end to end around a selected
    /// country pinned at the bottom of both boards.
    fn reversed_boards() -> (Vec<RankedRow>, Vec<RankedRow>) {
        let ids: Vec<String> = (0..13).map(|i| format!("C{i:02}")).collect();
        let mut base: Vec<(&str, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), 100.0 - 5.0 * i as f64))
            .collect();
        let mut scenario: Vec<(&str, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), 40.0 + 5.0 * i as f64))
            .collect();
        base.push(("SEL", 37.0));
        scenario.push(("SEL", 37.0));
        (board(&base), board(&scenario))
    }

    #[test]
    fn impacts_are_capped_and_sorted() {
        let (base, scenario) = reversed_boards();
        let limits = ImpactLimits::default();
        let (impacts, arrows) = build_country_impacts("SEL", &base, &scenario, &limits);

        assert_eq!(impacts.len(), 8);
        assert_eq!(arrows.len(), 8);
        let order: Vec<&str> = impacts.iter().map(|i| i.iso3.as_str()).collect();
        assert_eq!(order, vec!["C12", "C00", "C11", "C01", "C10", "C09", "C08", "C07"]);
        assert_eq!(impacts[0].rank_delta, 12);
        assert_eq!(impacts[1].rank_delta, -12);

        let capped = ImpactLimits {
            impact_cap: 3,
            ..ImpactLimits::default()
        };
        let (impacts, arrows) = build_country_impacts("SEL", &base, &scenario, &capped);
        assert_eq!(impacts.len(), 3);
        assert_eq!(arrows.len(), 3);
    }

    #[test]
    fn movers_are_capped_in_scenario_order() {
        let (base, scenario) = reversed_boards();
        let movers_only = ImpactLimits {
            neighbour_radius: 0,
            mover_cap: 6,
            impact_cap: 20,
        };
        let (impacts, _) = build_country_impacts("SEL", &base, &scenario, &movers_only);

        let mut ids: Vec<&str> = impacts.iter().map(|i| i.iso3.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["C07", "C08", "C09", "C10", "C11", "C12"]);
    }

    #[test]
    fn missing_selected_country_yields_nothing() {
        let (base, scenario) = reversed_boards();
        let limits = ImpactLimits::default();
        let (impacts, arrows) = build_country_impacts("ZZZ", &base, &scenario, &limits);
        assert!(impacts.is_empty() && arrows.is_empty());
    }

    #[test]
    fn move_direction_follows_rank_delta_sign() {
        assert_eq!(MoveDirection::from_rank_delta(2), MoveDirection::Up);
        assert_eq!(MoveDirection::from_rank_delta(-1), MoveDirection::Down);
        assert_eq!(MoveDirection::from_rank_delta(0), MoveDirection::Flat);
    }
}
