//! Per-quarter country rows and whole-population ranking.

use crate::types::{Iso3, Rank};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One country's recomputed metrics for one simulated quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterRow {
    pub iso3: Iso3,
    pub country: String,
    /// OCI plus dataset adjustment; the ranking key.
    pub overlooked_score: f64,
    pub severity_score: f64,
    pub funding_received: f64,
    pub percent_funded: f64,
    pub projected_neglect: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: Rank,
    #[serde(flatten)]
    pub row: QuarterRow,
}

/// Rank by descending overlooked score. The sort is stable, so ties keep
/// population order.
pub fn rank_rows(mut rows: Vec<QuarterRow>) -> Vec<RankedRow> {
    rows.sort_by(|a, b| b.overlooked_score.total_cmp(&a.overlooked_score));
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| RankedRow { rank: i + 1, row })
        .collect()
}

/// Lookup by iso3 into a ranking.
pub fn index_by_iso3(ranked: &[RankedRow]) -> HashMap<&str, &RankedRow> {
    ranked.iter().map(|r| (r.row.iso3.as_str(), r)).collect()
}

pub fn find<'a>(ranked: &'a [RankedRow], iso3: &str) -> Option<&'a RankedRow> {
    ranked.iter().find(|r| r.row.iso3 == iso3)
}

/// Countries within `radius` positions of `selected`, excluding it.
/// Empty when `selected` is not ranked.
pub fn neighbours_within(ranked: &[RankedRow], selected: &str, radius: usize) -> Vec<Iso3> {
    let Some(position) = ranked.iter().position(|r| r.row.iso3 == selected) else {
        return Vec::new();
    };
    let lo = position.saturating_sub(radius);
    let hi = (position + radius).min(ranked.len() - 1);
    ranked[lo..=hi]
        .iter()
        .filter(|r| r.row.iso3 != selected)
        .map(|r| r.row.iso3.clone())
        .collect()
}

/// Order-preserving union of iso3 lists.
pub fn union_preserving_order<I>(lists: I) -> Vec<Iso3>
where
    I: IntoIterator<Item = Vec<Iso3>>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for iso3 in list {
            if seen.insert(iso3.clone()) {
                out.push(iso3);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(iso3: &str, score: f64) -> QuarterRow {
        QuarterRow {
            iso3: iso3.into(),
            country: iso3.into(),
            overlooked_score: score,
            severity_score: 0.0,
            funding_received: 0.0,
            percent_funded: 0.0,
            projected_neglect: 0.0,
        }
    }

    #[test]
    fn ties_keep_population_order() {
        let ranked = rank_rows(vec![row("AAA", 50.0), row("BBB", 70.0), row("CCC", 50.0)]);
        let order: Vec<&str> = ranked.iter().map(|r| r.row.iso3.as_str()).collect();
        assert_eq!(order, vec!["BBB", "AAA", "CCC"]);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn neighbour_window_is_clipped_at_edges() {
        let ranked = rank_rows(
            (0..6)
                .map(|i| row(&format!("C{i:02}"), 100.0 - f64::from(i)))
                .collect(),
        );
        assert_eq!(neighbours_within(&ranked, "C00", 2), vec!["C01", "C02"]);
        assert_eq!(
            neighbours_within(&ranked, "C03", 2),
            vec!["C01", "C02", "C04", "C05"]
        );
        assert!(neighbours_within(&ranked, "ZZZ", 2).is_empty());
    }
}
