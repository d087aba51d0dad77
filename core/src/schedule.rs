//! Quarterly simulation schedule.
//!
//! Eight fixed steps, three months apart. Quarter `i` of `n` applies
//! `i/n` of the allocation, so the last quarter carries all of it.

use crate::types::MonthsAhead;
use serde::Serialize;

pub const MONTHS_PER_QUARTER: MonthsAhead = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuarterStep {
    pub quarter_label: &'static str,
    pub quarter_index: u32,
    pub months_ahead: MonthsAhead,
}

impl QuarterStep {
    const fn new(quarter_label: &'static str, quarter_index: u32) -> Self {
        Self {
            quarter_label,
            quarter_index,
            months_ahead: quarter_index * MONTHS_PER_QUARTER,
        }
    }

    /// Fraction of the allocation disbursed by the end of this quarter.
    pub fn progress(&self) -> f64 {
        f64::from(self.quarter_index) / QUARTERLY_STEPS.len() as f64
    }
}

/// NEVER reorder. Quarter snapshots are emitted in this order.
pub const QUARTERLY_STEPS: [QuarterStep; 8] = [
    QuarterStep::new("Q+1", 1),
    QuarterStep::new("Q+2", 2),
    QuarterStep::new("Q+3", 3),
    QuarterStep::new("Q+4", 4),
    QuarterStep::new("Q+5", 5),
    QuarterStep::new("Q+6", 6),
    QuarterStep::new("Q+7", 7),
    QuarterStep::new("Q+8", 8),
];

/// Parse a horizon out of an upstream step label.
///
/// `q2` / `Q+2` → 6 months, `18mo` / `18 months` → 18. Anything else → None.
pub fn infer_months_ahead(step: &str) -> Option<MonthsAhead> {
    let normalized = step.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(rest) = normalized.strip_prefix('q') {
        let digits = rest.strip_prefix('+').unwrap_or(rest);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .parse::<MonthsAhead>()
                .ok()
                .and_then(|q| q.checked_mul(MONTHS_PER_QUARTER));
        }
    }

    let start = normalized.find(|c: char| c.is_ascii_digit())?;
    let tail = &normalized[start..];
    let end = tail
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(tail.len());
    let unit = tail[end..].trim_start();
    if unit.starts_with("mo") {
        return tail[..end].parse().ok();
    }
    None
}
