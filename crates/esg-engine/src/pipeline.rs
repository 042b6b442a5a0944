//! Loaded inputs plus the two end-to-end operations callers use: rank the
//! dataset, and run a scenario straight through to an exported artifact.

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::AppError;
use crate::export::{export_run, ExportArtifact, ExportError};
use crate::scenarios::{
    rank_by_final_score, DistanceMetric, KnnParams, RankedEntry, ScenarioError, ScenarioKind,
    ScenarioParams, ScenarioRunner,
};
use crate::scoring::{
    BandRepository, ConfigurationError, QualityReport, ScoringEngine, ScoringSettings,
    SupplierRecord,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A ranked table of the baseline scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedEntry>,
    pub quality: QualityReport,
}

pub fn rank_suppliers(engine: &ScoringEngine, suppliers: &[SupplierRecord]) -> Ranking {
    let batch = engine.score_all(suppliers);
    Ranking {
        entries: rank_by_final_score(batch.scored),
        quality: batch.quality,
    }
}

/// Parses the kind and validates parameters before any scoring starts, then
/// exports only once every variant has finished.
pub fn run_scenario(
    runner: &ScenarioRunner,
    suppliers: &[SupplierRecord],
    kind: &str,
    params: &ScenarioParams,
    output_name: &str,
) -> Result<ExportArtifact, PipelineError> {
    let kind: ScenarioKind = kind.parse().map_err(ScenarioError::from)?;
    let run = runner.run(kind, suppliers, params)?;
    Ok(export_run(&run, output_name)?)
}

/// Immutable snapshot of bands, settings and dataset shared by the CLI and
/// the HTTP service.
#[derive(Debug, Clone)]
pub struct EngineContext {
    dataset: Arc<Dataset>,
    runner: ScenarioRunner,
}

impl EngineContext {
    pub fn load(config: &EngineConfig) -> Result<Self, AppError> {
        let bands = BandRepository::from_path(&config.bands_path)?;
        tracing::info!(
            path = %config.bands_path.display(),
            version = bands.version().unwrap_or("unversioned"),
            "bands loaded"
        );

        let settings = match &config.settings_path {
            Some(path) => ScoringSettings::from_path(path)?,
            None => ScoringSettings::default(),
        };
        let dataset = Dataset::load(&config.dataset_path)?;
        dataset.matches_bands(&bands);

        Ok(Self::new(Arc::new(bands), settings, dataset, config)?)
    }

    pub fn new(
        bands: Arc<BandRepository>,
        settings: ScoringSettings,
        dataset: Dataset,
        config: &EngineConfig,
    ) -> Result<Self, ConfigurationError> {
        let engine = ScoringEngine::new(bands, settings)?;
        let runner = ScenarioRunner::new(engine)
            .with_default_seed(config.scenario_seed)
            .with_default_knn(KnnParams {
                k: config.knn_k,
                distance: DistanceMetric::default(),
            });
        Ok(Self {
            dataset: Arc::new(dataset),
            runner,
        })
    }

    /// The same inputs scored under caller-supplied settings.
    pub fn with_settings(&self, settings: ScoringSettings) -> Result<Self, ConfigurationError> {
        Ok(Self {
            dataset: Arc::clone(&self.dataset),
            runner: self.runner.with_settings(settings)?,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn engine(&self) -> &ScoringEngine {
        self.runner.engine()
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    pub fn rank(&self) -> Ranking {
        rank_suppliers(self.engine(), &self.dataset.suppliers)
    }

    pub fn run_scenario(
        &self,
        kind: &str,
        params: &ScenarioParams,
        output_name: &str,
    ) -> Result<ExportArtifact, PipelineError> {
        run_scenario(
            &self.runner,
            &self.dataset.suppliers,
            kind,
            params,
            output_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetMetadata;
    use crate::scenarios::ScenarioParameterError;
    use crate::scoring::{IndustryBand, Metric, RawMetric};
    use chrono::{TimeZone, Utc};

    fn context() -> EngineContext {
        let bands = BandRepository::from_industries(
            Some("bands_v1".to_string()),
            [(
                "global",
                Metric::ALL
                    .into_iter()
                    .filter(|metric| metric.is_banded())
                    .map(|metric| (metric, IndustryBand::new(0.0, 50.0, 100.0).expect("band")))
                    .collect::<Vec<_>>(),
            )],
        )
        .expect("bands");
        let suppliers = vec![
            SupplierRecord::new("S-1", "Acme", "DE", "Textiles")
                .with_revenue(10.0)
                .with_profit_margin(0.2)
                .with_metric(RawMetric::Emissions, 100.0),
            SupplierRecord::new("S-2", "Borealis", "SE", "Textiles")
                .with_revenue(10.0)
                .with_profit_margin(0.05)
                .with_metric(RawMetric::Emissions, 50.0),
        ];
        let dataset = Dataset::new(
            DatasetMetadata {
                version: "test".to_string(),
                bands_version: "bands_v1".to_string(),
                generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
            suppliers,
        )
        .expect("dataset");
        EngineContext::new(
            Arc::new(bands),
            ScoringSettings::default(),
            dataset,
            &EngineConfig::default(),
        )
        .expect("context")
    }

    #[test]
    fn unknown_kind_is_rejected_before_scoring() {
        let error = context()
            .run_scenario("s7", &ScenarioParams::default(), "out")
            .expect_err("unknown kind");
        assert!(matches!(
            error,
            PipelineError::Scenario(ScenarioError::Parameter(
                ScenarioParameterError::UnsupportedKind(_)
            ))
        ));
    }

    #[test]
    fn utility_scenario_exports_a_single_csv() {
        let params = ScenarioParams {
            min_margin: Some(0.1),
            ..ScenarioParams::default()
        };
        let artifact = context()
            .run_scenario("s1", &params, "margin check")
            .expect("artifact");
        assert_eq!(artifact.file_name, "margin_check.csv");
        assert_eq!(artifact.content_type, "text/csv");

        let text = String::from_utf8(artifact.bytes).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).is_some_and(|row| row.starts_with("S-1,1,")));
    }

    #[test]
    fn settings_override_is_validated() {
        let mut settings = ScoringSettings::default();
        settings.risk_threshold = 1.5;
        assert_eq!(
            context().with_settings(settings).map(|_| ()),
            Err(ConfigurationError::RiskThreshold(1.5))
        );
    }

    #[test]
    fn ranking_covers_the_whole_dataset() {
        let ranking = context().rank();
        assert_eq!(ranking.entries.len(), 2);
        assert_eq!(ranking.quality.suppliers_scored, 2);
        assert_eq!(ranking.entries[0].rank, 1);
    }
}
