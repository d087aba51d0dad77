//! Overlooked Crisis Index engine.
//!
//! Scores countries by the Overlooked Crisis Index (OCI), projects their
//! neglect trajectory over an 8-quarter horizon under a funding scenario,
//! re-ranks the whole population every quarter and classifies how the
//! allocation moves every other tracked country. Independently, flags
//! anomalous humanitarian projects within their funding cluster.
//!
//! Everything here is pure, synchronous computation over caller-owned
//! snapshots. Nothing is fetched, persisted or mutated in place.

pub mod brief;
pub mod comparables;
pub mod config;
pub mod country;
pub mod engine;
pub mod error;
pub mod heatmap;
pub mod impact;
pub mod name_generator;
pub mod oci;
pub mod outliers;
pub mod outlook;
pub mod population;
pub mod project;
pub mod projection;
pub mod ranking;
pub mod resolve;
pub mod rng;
pub mod schedule;
pub mod snapshot;
pub mod stats;
pub mod types;

pub use config::EngineConfig;
pub use country::{CountryRecord, FundingTrendPoint, Population, ProjectionPoint};
pub use engine::{simulate, Simulator};
pub use error::{OciError, OciResult};
pub use project::{OutlierFlag, ProjectRecord};
pub use snapshot::{QuarterSnapshot, SimulationResult};
