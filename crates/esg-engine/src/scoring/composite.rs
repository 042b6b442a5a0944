use super::domain::{MetricValue, ResolvedMetrics, RiskLevel, SupplierRecord};
use super::metrics::{Metric, Pillar, RiskMetric};
use super::pillar::PillarScores;
use super::settings::{PillarWeights, RiskPenaltyMode, RiskWeights, ScoringSettings};

/// Neutral level assumed for a missing risk metric.
pub const NEUTRAL_RISK: f64 = 0.2;
/// Completeness ratio below which the final score is capped.
pub const COMPLETENESS_THRESHOLD: f64 = 0.70;
/// Ceiling applied to incomplete suppliers.
pub const COMPLETENESS_CAP: f64 = 50.0;

/// `100 * sum(pillar_weight * pillar / 100)`.
pub fn composite_score(pillars: &PillarScores, weights: &PillarWeights) -> f64 {
    100.0
        * Pillar::ALL
            .into_iter()
            .map(|pillar| weights.get(pillar) * pillars.get(pillar) / 100.0)
            .sum::<f64>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub risk_factor: f64,
    pub defaulted: Vec<RiskMetric>,
}

/// Weighted average of the risk inputs. Missing inputs count at the neutral
/// level so the denominator never shrinks.
pub fn risk_factor(record: &SupplierRecord, weights: &RiskWeights) -> RiskAssessment {
    let mut defaulted = Vec::new();
    let mut weighted = 0.0;

    for metric in RiskMetric::ALL {
        let value = match record.number(metric.raw()) {
            Some(value) => value.clamp(0.0, 1.0),
            None => {
                defaulted.push(metric);
                NEUTRAL_RISK
            }
        };
        weighted += weights.get(metric) * value;
    }

    let total = weights.sum();
    let risk_factor = if total > 0.0 { weighted / total } else { NEUTRAL_RISK };

    RiskAssessment {
        risk_factor,
        defaulted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAdjustment {
    pub adjusted: f64,
    pub penalty: f64,
}

pub fn apply_risk(composite: f64, risk_factor: f64, settings: &ScoringSettings) -> RiskAdjustment {
    match settings.risk_penalty_mode {
        RiskPenaltyMode::Multiplicative => {
            let adjusted = composite * (1.0 - risk_factor);
            RiskAdjustment {
                adjusted,
                penalty: composite - adjusted,
            }
        }
        RiskPenaltyMode::Threshold => {
            let excess =
                settings.risk_lambda * (risk_factor - settings.risk_threshold).max(0.0) * 100.0;
            let adjusted = (composite - excess).max(0.0);
            // penalty is what the floor let through: composite - penalty == adjusted
            RiskAdjustment {
                adjusted,
                penalty: composite - adjusted,
            }
        }
    }
}

/// Share of the scored metrics actually observed. Imputed values never count
/// and the anti-corruption flag only counts when it is set.
pub fn completeness_ratio(metrics: &ResolvedMetrics) -> f64 {
    let present = Metric::ALL
        .into_iter()
        .filter(|metric| match metrics.get(*metric) {
            MetricValue::Present { value } if *metric == Metric::AntiCorruption => value >= 0.5,
            value => value.is_present(),
        })
        .count();
    present as f64 / Metric::ALL.len() as f64
}

/// Clamp applied after risk adjustment. Returns the score and whether it bit.
pub fn apply_completeness_cap(score: f64, completeness_ratio: f64) -> (f64, bool) {
    if completeness_ratio < COMPLETENESS_THRESHOLD {
        (score.min(COMPLETENESS_CAP), true)
    } else {
        (score, false)
    }
}

/// Composite, risk factor, penalty and completeness for one supplier.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutcome {
    pub composite: f64,
    pub risk: RiskAssessment,
    pub risk_level: RiskLevel,
    pub penalty: f64,
    pub completeness_ratio: f64,
    pub completeness_capped: bool,
    pub final_score: f64,
}

pub struct CompositeRiskScorer<'a> {
    settings: &'a ScoringSettings,
}

impl<'a> CompositeRiskScorer<'a> {
    pub fn new(settings: &'a ScoringSettings) -> Self {
        Self { settings }
    }

    pub fn score(
        &self,
        record: &SupplierRecord,
        pillars: &PillarScores,
        metrics: &ResolvedMetrics,
    ) -> CompositeOutcome {
        let composite = composite_score(pillars, &self.settings.pillar_weights);
        let risk = risk_factor(record, &self.settings.risk_weights);
        let adjustment = apply_risk(composite, risk.risk_factor, self.settings);
        let completeness = completeness_ratio(metrics);
        let (final_score, capped) = apply_completeness_cap(adjustment.adjusted, completeness);

        CompositeOutcome {
            composite,
            risk_level: RiskLevel::classify(risk.risk_factor),
            risk,
            penalty: adjustment.penalty,
            completeness_ratio: completeness,
            completeness_capped: capped,
            final_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::metrics::RawMetric;
    use std::collections::BTreeMap;

    fn settings(mode: RiskPenaltyMode) -> ScoringSettings {
        ScoringSettings {
            risk_penalty_mode: mode,
            risk_threshold: 0.3,
            risk_lambda: 1.0,
            ..ScoringSettings::default()
        }
    }

    #[test]
    fn multiplicative_mode_scales_composite() {
        let adjustment = apply_risk(80.0, 0.5, &settings(RiskPenaltyMode::Multiplicative));
        assert!((adjustment.adjusted - 40.0).abs() < 1e-9);
        assert!((adjustment.penalty - 40.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_mode_subtracts_scaled_excess() {
        let adjustment = apply_risk(80.0, 0.5, &settings(RiskPenaltyMode::Threshold));
        assert!((adjustment.penalty - 20.0).abs() < 1e-9);
        assert!((adjustment.adjusted - 60.0).abs() < 1e-9);

        let below = apply_risk(80.0, 0.1, &settings(RiskPenaltyMode::Threshold));
        assert_eq!(below.penalty, 0.0);
        assert_eq!(below.adjusted, 80.0);
    }

    #[test]
    fn threshold_mode_floors_at_zero() {
        let mut settings = settings(RiskPenaltyMode::Threshold);
        settings.risk_lambda = 5.0;
        let adjustment = apply_risk(10.0, 0.9, &settings);
        assert_eq!(adjustment.adjusted, 0.0);
    }

    #[test]
    fn floored_penalty_reconciles_with_the_composite() {
        let mut settings = settings(RiskPenaltyMode::Threshold);
        settings.risk_lambda = 5.0;
        let composite = 22.9;
        let adjustment = apply_risk(composite, 1.0, &settings);
        assert_eq!(adjustment.adjusted, 0.0);
        assert_eq!(adjustment.penalty, composite - adjustment.adjusted);
        assert!(adjustment.penalty <= composite);
    }

    #[test]
    fn missing_risk_metrics_default_to_neutral_without_shrinking() {
        let record = SupplierRecord::new("S-1", "Acme", "DE", "Textiles")
            .with_metric(RawMetric::GeopoliticalRisk, 0.7);
        let assessment = risk_factor(&record, &RiskWeights::default());
        // 0.4 * 0.7 + 0.3 * 0.2 + 0.3 * 0.2
        assert!((assessment.risk_factor - 0.4).abs() < 1e-9);
        assert_eq!(
            assessment.defaulted,
            vec![RiskMetric::Climate, RiskMetric::LaborDispute]
        );
    }

    #[test]
    fn composite_blends_pillars() {
        let pillars = PillarScores {
            environmental: 50.0,
            social: 100.0,
            governance: 0.0,
        };
        let composite = composite_score(&pillars, &PillarWeights::default());
        assert!((composite - 50.0).abs() < 1e-9);
    }

    #[test]
    fn completeness_counts_only_observed_values() {
        let mut values = BTreeMap::new();
        for metric in Metric::ALL {
            values.insert(metric, MetricValue::Present { value: 1.0 });
        }
        values.insert(Metric::AntiCorruption, MetricValue::Present { value: 0.0 });
        values.insert(
            Metric::WageRatio,
            MetricValue::Imputed {
                value: 1.0,
                source: crate::scoring::domain::ImputationSource::GlobalAverage,
            },
        );
        let ratio = completeness_ratio(&ResolvedMetrics { values });
        assert!((ratio - 10.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn cap_applies_below_threshold_only() {
        assert_eq!(apply_completeness_cap(80.0, 0.5), (50.0, true));
        assert_eq!(apply_completeness_cap(30.0, 0.5), (30.0, true));
        assert_eq!(apply_completeness_cap(80.0, 0.75), (80.0, false));
    }
}
