//! Shared primitive types used across the engine.

/// Upper-case ISO 3166-1 alpha-3 country code, the population key.
pub type Iso3 = String;

/// Stable identifier of a humanitarian project.
pub type ProjectId = String;

/// Forecast horizon in months. Zero means "now".
pub type MonthsAhead = u32;

/// One-based position in a ranking. Rank 1 is the most overlooked crisis.
pub type Rank = usize;
