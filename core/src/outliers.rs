//! Project outlier detection: robust z-scores within funding clusters.
//!
//! Budgets are heavy-tailed, so the score works in log space and uses
//! the median absolute deviation rather than the standard deviation.
//! A cluster with no spread scores every member 0.

use crate::{
    project::{budget_to_reach, OutlierFlag, ProjectRecord},
    stats::{robust_z_scores, round_to, safe_log10},
};
use std::collections::HashMap;

pub const DEFAULT_Z_THRESHOLD: f64 = 1.8;

/// Reach per million USD, in log10.
const BBR_SCALE: f64 = 1_000_000.0;

/// Annotate a batch with `bbr`, `bbr_z_score` and `outlier_flag`.
/// Output order matches input order.
pub fn annotate_project_outliers(projects: &[ProjectRecord]) -> Vec<ProjectRecord> {
    annotate_with_threshold(projects, DEFAULT_Z_THRESHOLD)
}

pub fn annotate_with_threshold(projects: &[ProjectRecord], threshold: f64) -> Vec<ProjectRecord> {
    let bbrs: Vec<f64> = projects
        .iter()
        .map(|p| budget_to_reach(p.people_targeted, p.budget_usd))
        .collect();

    let mut clusters: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, project) in projects.iter().enumerate() {
        clusters.entry(project.cluster_name.as_str()).or_default().push(i);
    }

    let mut z_scores = vec![0.0; projects.len()];
    for (cluster, members) in &clusters {
        let values: Vec<f64> = members
            .iter()
            .map(|&i| safe_log10(bbrs[i] * BBR_SCALE))
            .collect();
        for (&i, z) in members.iter().zip(robust_z_scores(&values)) {
            z_scores[i] = round_to(z, 3);
        }
        log::debug!("Cluster '{cluster}': scored {} projects", members.len());
    }

    projects
        .iter()
        .zip(bbrs)
        .zip(z_scores)
        .map(|((project, bbr), z)| ProjectRecord {
            bbr,
            bbr_z_score: z,
            outlier_flag: OutlierFlag::from_z(z, threshold),
            ..project.clone()
        })
        .collect()
}

/// The `n` most anomalous projects, by |z| descending. Ties keep input
/// order.
pub fn most_anomalous(annotated: &[ProjectRecord], n: usize) -> Vec<ProjectRecord> {
    let mut ranked = annotated.to_vec();
    ranked.sort_by(|a, b| b.bbr_z_score.abs().total_cmp(&a.bbr_z_score.abs()));
    ranked.truncate(n);
    ranked
}
