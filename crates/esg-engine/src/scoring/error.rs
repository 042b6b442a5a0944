use super::metrics::{Metric, Pillar};

/// Fatal configuration problems. Surfaced before any supplier is scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{field} weight must be a finite, non-negative number (got {value})")]
    InvalidWeight { field: String, value: f64 },
    #[error("pillar weights must sum to 1.0 +/- 0.1 (got {sum:.4})")]
    PillarWeightSum { sum: f64 },
    #[error("{} metric weights must sum to 1.0 (got {sum:.4})", pillar.label())]
    MetricWeightSum { pillar: Pillar, sum: f64 },
    #[error("metric '{metric}' does not belong to the {} pillar", pillar.label())]
    ForeignMetric { pillar: Pillar, metric: Metric },
    #[error("risk weights must sum to 1.0 +/- 0.1 (got {sum:.4})")]
    RiskWeightSum { sum: f64 },
    #[error("risk threshold must lie in [0, 1] (got {0})")]
    RiskThreshold(f64),
    #[error("risk scaling factor must be greater than 0 (got {0})")]
    RiskLambda(f64),
    #[error("no global band fallback for metric '{0}'")]
    MissingGlobalBand(Metric),
}
