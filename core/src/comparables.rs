//! Comparable-project search: nearest peers in a 4-feature space.

use crate::{
    project::ProjectRecord,
    stats::{clamp_percent, round_to, safe_log10},
    types::ProjectId,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPARABLE_ROWS: usize = 5;

/// Same-cluster pools smaller than this fall back to the whole batch.
const MIN_CLUSTER_PEERS: usize = 4;
const SIMILAR_BUDGET_RATIO: f64 = 0.35;
const SIMILAR_FUNDING_POINTS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableProject {
    pub project_id: ProjectId,
    pub similarity_score: f64,
    /// Peer BBR relative to the target's, in percent.
    pub efficiency_delta_pct: f64,
    pub rationale: String,
}

fn features(project: &ProjectRecord) -> [f64; 4] {
    [
        safe_log10(project.budget_usd),
        safe_log10(project.people_targeted),
        clamp_percent(project.funding_pct) / 100.0,
        project.bbr_z_score,
    ]
}

fn distance(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn rationale(target: &ProjectRecord, peer: &ProjectRecord) -> String {
    let cluster = if peer.cluster_name == target.cluster_name {
        "same cluster"
    } else {
        "cross-cluster match"
    };
    let budget = if (peer.budget_usd - target.budget_usd).abs() / target.budget_usd.max(1.0)
        < SIMILAR_BUDGET_RATIO
    {
        "similar budget scale"
    } else {
        "different budget scale"
    };
    let coverage = if (peer.funding_pct - target.funding_pct).abs() < SIMILAR_FUNDING_POINTS {
        "similar funding coverage"
    } else {
        "coverage differs"
    };
    format!("{cluster}, {budget}, {coverage}")
}

/// Up to `max_rows` peers most similar to `target`, best first.
///
/// Run on an annotated batch: the z-score is one of the features.
pub fn comparable_projects_for(
    target: &ProjectRecord,
    projects: &[ProjectRecord],
    max_rows: usize,
) -> Vec<ComparableProject> {
    let others: Vec<&ProjectRecord> = projects
        .iter()
        .filter(|p| p.project_id != target.project_id)
        .collect();
    let same_cluster: Vec<&ProjectRecord> = others
        .iter()
        .copied()
        .filter(|p| p.cluster_name == target.cluster_name)
        .collect();
    let pool = if same_cluster.len() >= MIN_CLUSTER_PEERS {
        same_cluster
    } else {
        others
    };

    let target_features = features(target);
    let mut rows: Vec<ComparableProject> = pool
        .into_iter()
        .map(|peer| {
            let similarity = (-distance(&features(peer), &target_features)).exp();
            let efficiency_delta_pct = if target.bbr > 0.0 {
                (peer.bbr - target.bbr) / target.bbr * 100.0
            } else {
                0.0
            };
            ComparableProject {
                project_id: peer.project_id.clone(),
                similarity_score: round_to(similarity, 3),
                efficiency_delta_pct: round_to(efficiency_delta_pct, 2),
                rationale: rationale(target, peer),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    rows.truncate(max_rows);
    rows
}
