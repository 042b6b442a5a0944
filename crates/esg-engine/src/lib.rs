//! ESG supplier scoring and deterministic scenario analysis.
//!
//! Raw supplier metrics are normalized against industry bands, combined into
//! pillar, composite and risk-adjusted scores, and re-scored under the four
//! scenario analyses. Ranked tables export as CSV or a zip of CSVs.

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod scenarios;
pub mod scoring;
pub mod telemetry;

pub use dataset::{Dataset, DatasetMetadata};
pub use export::ExportArtifact;
pub use pipeline::{rank_suppliers, run_scenario, EngineContext, Ranking};
pub use scenarios::{ScenarioKind, ScenarioParams, ScenarioRunner};
pub use scoring::{BandRepository, ScoringEngine, ScoringSettings, SupplierRecord};
