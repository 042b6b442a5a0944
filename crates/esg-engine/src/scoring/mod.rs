//! Supplier scoring: bands, normalization, pillar and composite/risk scoring.
//!
//! [`ScoringEngine`] is the stateless entry point. It pairs a read-only
//! [`BandRepository`] snapshot with a validated [`ScoringSettings`] value and
//! scores suppliers independently of each other, so a full collection pass
//! fans out across threads and still returns results in input order.

pub mod bands;
pub mod composite;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod pillar;
pub mod quality;
pub mod resolve;
pub mod settings;

pub use bands::{BandError, BandRepository, BandSource, IndustryBand};
pub use domain::{
    ImputationSource, MetricValue, RawValue, ResolvedMetrics, RiskLevel, ScoredSupplier,
    SupplierRecord,
};
pub use error::ConfigurationError;
pub use metrics::{Direction, Metric, Pillar, RawMetric, RiskMetric};
pub use normalize::{NormalizationMode, Normalizer};
pub use quality::{DataQualityWarning, QualityReport, WarningKind};
pub use resolve::Observation;
pub use settings::{
    MetricWeights, PillarWeights, RiskPenaltyMode, RiskWeights, ScoringSettings, SettingsError,
};

use composite::CompositeRiskScorer;
use pillar::PillarScorer;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// One supplier's score together with the data-quality findings behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub scored: ScoredSupplier,
    pub warnings: Vec<DataQualityWarning>,
}

/// Scores for a whole collection, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredBatch {
    pub scored: Vec<ScoredSupplier>,
    pub quality: QualityReport,
}

impl ScoredBatch {
    fn collect(outcomes: Vec<ScoreOutcome>) -> Self {
        let mut quality = QualityReport::default();
        let mut scored = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            quality.record(outcome.warnings);
            scored.push(outcome.scored);
        }
        Self { scored, quality }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    bands: Arc<BandRepository>,
    settings: ScoringSettings,
    normalization: NormalizationMode,
}

impl ScoringEngine {
    /// Validates the settings and band coverage up front; nothing is scored
    /// against a broken configuration.
    pub fn new(
        bands: Arc<BandRepository>,
        settings: ScoringSettings,
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        bands.ensure_global_coverage()?;
        Ok(Self {
            bands,
            settings,
            normalization: NormalizationMode::Standard,
        })
    }

    /// Same bands, different settings.
    pub fn with_settings(&self, settings: ScoringSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self {
            bands: Arc::clone(&self.bands),
            settings,
            normalization: self.normalization,
        })
    }

    pub fn with_normalization(&self, normalization: NormalizationMode) -> Self {
        Self {
            normalization,
            ..self.clone()
        }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub fn bands(&self) -> &BandRepository {
        &self.bands
    }

    pub fn normalization(&self) -> NormalizationMode {
        self.normalization
    }

    pub fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(
            &self.bands,
            self.settings.use_industry_bands,
            self.normalization,
        )
    }

    /// Scores one supplier using band-average imputation.
    pub fn score(&self, record: &SupplierRecord) -> ScoreOutcome {
        let observation = resolve::observe(record);
        self.score_observation(record, observation)
    }

    /// Scores a supplier whose observed values may still contain gaps; the
    /// remaining gaps are filled with band averages.
    pub fn score_observation(
        &self,
        record: &SupplierRecord,
        observation: Observation,
    ) -> ScoreOutcome {
        let Observation {
            metrics,
            mut warnings,
        } = observation;
        let metrics = resolve::impute_means(
            &metrics,
            &record.industry,
            &self.bands,
            self.settings.use_industry_bands,
        );

        let pillars = PillarScorer::new(self.normalizer(), &self.settings.metric_weights)
            .score(&record.industry, &metrics);
        let outcome = CompositeRiskScorer::new(&self.settings).score(record, &pillars, &metrics);

        if !outcome.risk.defaulted.is_empty() {
            warnings.push(DataQualityWarning::new(
                &record.id,
                WarningKind::RiskDefaulted {
                    metrics: outcome.risk.defaulted.clone(),
                },
            ));
        }
        if outcome.completeness_capped {
            warnings.push(DataQualityWarning::new(
                &record.id,
                WarningKind::CompletenessCapped {
                    ratio: outcome.completeness_ratio,
                },
            ));
        }

        ScoreOutcome {
            scored: ScoredSupplier {
                supplier_id: record.id.clone(),
                name: record.name.clone(),
                industry: record.industry.clone(),
                environmental: pillars.environmental,
                social: pillars.social,
                governance: pillars.governance,
                composite: outcome.composite,
                risk_factor: outcome.risk.risk_factor,
                risk_level: outcome.risk_level,
                risk_penalty: outcome.penalty,
                completeness_ratio: outcome.completeness_ratio,
                completeness_capped: outcome.completeness_capped,
                final_score: outcome.final_score,
                imputed_metrics: metrics.imputed(),
            },
            warnings,
        }
    }

    /// Scores every supplier in parallel; output order matches input order.
    pub fn score_all(&self, records: &[SupplierRecord]) -> ScoredBatch {
        let outcomes: Vec<ScoreOutcome> = records
            .par_iter()
            .map(|record| self.score(record))
            .collect();
        let batch = ScoredBatch::collect(outcomes);
        tracing::debug!(
            suppliers = batch.scored.len(),
            warnings = batch.quality.warnings.len(),
            capped = batch.quality.capped_suppliers,
            "scored supplier batch"
        );
        batch
    }

    /// Scores suppliers paired with pre-computed observations (for example
    /// after nearest-neighbour imputation).
    pub fn score_observations(
        &self,
        records: &[SupplierRecord],
        observations: Vec<Observation>,
    ) -> ScoredBatch {
        let outcomes: Vec<ScoreOutcome> = records
            .par_iter()
            .zip(observations.into_par_iter())
            .map(|(record, observation)| self.score_observation(record, observation))
            .collect();
        ScoredBatch::collect(outcomes)
    }
}
