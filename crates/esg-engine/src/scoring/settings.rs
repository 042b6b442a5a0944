use super::error::ConfigurationError;
use super::metrics::{Metric, Pillar, RiskMetric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const SUM_TOLERANCE: f64 = 0.1;
const METRIC_SUM_TOLERANCE: f64 = 0.01;

/// Blend of the three pillars into the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    pub environmental: f64,
    pub social: f64,
    pub governance: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            environmental: 0.4,
            social: 0.3,
            governance: 0.3,
        }
    }
}

impl PillarWeights {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environmental => self.environmental,
            Pillar::Social => self.social,
            Pillar::Governance => self.governance,
        }
    }

    fn get_mut(&mut self, pillar: Pillar) -> &mut f64 {
        match pillar {
            Pillar::Environmental => &mut self.environmental,
            Pillar::Social => &mut self.social,
            Pillar::Governance => &mut self.governance,
        }
    }

    pub fn sum(&self) -> f64 {
        self.environmental + self.social + self.governance
    }

    /// Scales one pillar by `1 + delta`, then renormalizes all three to 1.0.
    pub fn perturbed(&self, pillar: Pillar, delta: f64) -> Self {
        let mut weights = *self;
        *weights.get_mut(pillar) *= 1.0 + delta;
        let sum = weights.sum();
        if sum > 0.0 {
            for pillar in Pillar::ALL {
                *weights.get_mut(pillar) /= sum;
            }
        }
        weights
    }
}

/// Weights of the metrics inside each pillar. Missing entries weigh zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub environmental: BTreeMap<Metric, f64>,
    pub social: BTreeMap<Metric, f64>,
    pub governance: BTreeMap<Metric, f64>,
}

impl Default for MetricWeights {
    fn default() -> Self {
        let even = |pillar: Pillar| {
            pillar
                .metrics()
                .into_iter()
                .map(|metric| (metric, 0.25))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            environmental: even(Pillar::Environmental),
            social: even(Pillar::Social),
            governance: even(Pillar::Governance),
        }
    }
}

impl MetricWeights {
    pub fn for_pillar(&self, pillar: Pillar) -> &BTreeMap<Metric, f64> {
        match pillar {
            Pillar::Environmental => &self.environmental,
            Pillar::Social => &self.social,
            Pillar::Governance => &self.governance,
        }
    }

    pub fn weight(&self, metric: Metric) -> f64 {
        self.for_pillar(metric.pillar())
            .get(&metric)
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub geopolitical: f64,
    pub climate: f64,
    pub labor: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            geopolitical: 0.4,
            climate: 0.3,
            labor: 0.3,
        }
    }
}

impl RiskWeights {
    pub fn get(&self, metric: RiskMetric) -> f64 {
        match metric {
            RiskMetric::Climate => self.climate,
            RiskMetric::Geopolitical => self.geopolitical,
            RiskMetric::LaborDispute => self.labor,
        }
    }

    pub fn sum(&self) -> f64 {
        self.geopolitical + self.climate + self.labor
    }
}

/// How the risk factor turns a composite score into the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskPenaltyMode {
    /// `Composite - lambda * max(0, risk - T) * 100`, floored at 0.
    #[default]
    Threshold,
    /// `Composite * (1 - risk)`.
    Multiplicative,
}

/// Immutable scoring configuration passed into every scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub pillar_weights: PillarWeights,
    pub metric_weights: MetricWeights,
    pub risk_weights: RiskWeights,
    pub risk_threshold: f64,
    pub risk_lambda: f64,
    pub use_industry_bands: bool,
    pub risk_penalty_mode: RiskPenaltyMode,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            pillar_weights: PillarWeights::default(),
            metric_weights: MetricWeights::default(),
            risk_weights: RiskWeights::default(),
            risk_threshold: 0.3,
            risk_lambda: 1.0,
            use_industry_bands: true,
            risk_penalty_mode: RiskPenaltyMode::Threshold,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read scoring settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("scoring settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

impl ScoringSettings {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses and validates; invalid settings never reach a scorer.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_reader(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_pillar_weights(&self, pillar_weights: PillarWeights) -> Self {
        Self {
            pillar_weights,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for pillar in Pillar::ALL {
            check_weight(
                &format!("{} pillar", pillar.label()),
                self.pillar_weights.get(pillar),
            )?;
        }
        let pillar_sum = self.pillar_weights.sum();
        if (pillar_sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ConfigurationError::PillarWeightSum { sum: pillar_sum });
        }

        for pillar in Pillar::ALL {
            let weights = self.metric_weights.for_pillar(pillar);
            for (metric, weight) in weights {
                if metric.pillar() != pillar {
                    return Err(ConfigurationError::ForeignMetric {
                        pillar,
                        metric: *metric,
                    });
                }
                check_weight(metric.key(), *weight)?;
            }
            let sum: f64 = weights.values().sum();
            if (sum - 1.0).abs() > METRIC_SUM_TOLERANCE {
                return Err(ConfigurationError::MetricWeightSum { pillar, sum });
            }
        }

        for metric in RiskMetric::ALL {
            check_weight(metric.raw().key(), self.risk_weights.get(metric))?;
        }
        let risk_sum = self.risk_weights.sum();
        if (risk_sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ConfigurationError::RiskWeightSum { sum: risk_sum });
        }

        if !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(ConfigurationError::RiskThreshold(self.risk_threshold));
        }
        if !(self.risk_lambda.is_finite() && self.risk_lambda > 0.0) {
            return Err(ConfigurationError::RiskLambda(self.risk_lambda));
        }

        Ok(())
    }
}

fn check_weight(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidWeight {
            field: field.to_string(),
            value,
        })
    }
}
