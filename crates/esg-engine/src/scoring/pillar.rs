use super::domain::ResolvedMetrics;
use super::metrics::Pillar;
use super::normalize::Normalizer;
use super::settings::MetricWeights;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PillarScores {
    pub environmental: f64,
    pub social: f64,
    pub governance: f64,
}

impl PillarScores {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environmental => self.environmental,
            Pillar::Social => self.social,
            Pillar::Governance => self.governance,
        }
    }
}

/// `pillar = 100 * sum(weight_i * normalized_i)` for each pillar.
pub struct PillarScorer<'a> {
    normalizer: Normalizer<'a>,
    weights: &'a MetricWeights,
}

impl<'a> PillarScorer<'a> {
    pub fn new(normalizer: Normalizer<'a>, weights: &'a MetricWeights) -> Self {
        Self {
            normalizer,
            weights,
        }
    }

    pub fn score(&self, industry: &str, metrics: &ResolvedMetrics) -> PillarScores {
        PillarScores {
            environmental: self.pillar(Pillar::Environmental, industry, metrics),
            social: self.pillar(Pillar::Social, industry, metrics),
            governance: self.pillar(Pillar::Governance, industry, metrics),
        }
    }

    pub fn pillar(&self, pillar: Pillar, industry: &str, metrics: &ResolvedMetrics) -> f64 {
        let weighted: f64 = pillar
            .metrics()
            .into_iter()
            .map(|metric| {
                let weight = self.weights.weight(metric);
                // Absent only survives when no band exists; it contributes nothing.
                let normalized = metrics
                    .get(metric)
                    .value()
                    .map(|value| self.normalizer.normalize(industry, metric, value))
                    .unwrap_or(0.0);
                weight * normalized
            })
            .sum();
        100.0 * weighted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::bands::{BandRepository, IndustryBand};
    use crate::scoring::domain::MetricValue;
    use crate::scoring::metrics::Metric;
    use crate::scoring::normalize::NormalizationMode;
    use std::collections::BTreeMap;

    fn bands() -> BandRepository {
        let band = |min, avg, max| IndustryBand::new(min, avg, max).expect("band");
        BandRepository::from_industries(
            None,
            [(
                "steel",
                vec![
                    (Metric::EmissionIntensity, band(0.0, 5.0, 10.0)),
                    (Metric::RenewablePct, band(0.0, 50.0, 100.0)),
                    (Metric::WaterIntensity, band(0.0, 2.0, 4.0)),
                    (Metric::WasteIntensity, band(0.0, 1.0, 2.0)),
                ],
            )],
        )
        .expect("bands")
    }

    fn metrics(values: &[(Metric, f64)]) -> ResolvedMetrics {
        ResolvedMetrics {
            values: values
                .iter()
                .map(|(metric, value)| (*metric, MetricValue::Present { value: *value }))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn environmental_pillar_is_weighted_sum_of_normalized_metrics() {
        let bands = bands();
        let weights = MetricWeights::default();
        let scorer = PillarScorer::new(
            Normalizer::new(&bands, true, NormalizationMode::Standard),
            &weights,
        );

        let metrics = metrics(&[
            (Metric::EmissionIntensity, 2.5),
            (Metric::RenewablePct, 100.0),
            (Metric::WaterIntensity, 4.0),
            (Metric::WasteIntensity, 1.0),
        ]);
        let score = scorer.pillar(Pillar::Environmental, "steel", &metrics);
        // 0.25 * (0.75 + 1.0 + 0.0 + 0.5) * 100
        assert!((score - 56.25).abs() < 1e-9);
    }

    #[test]
    fn pillar_scores_stay_within_zero_and_hundred() {
        let bands = bands();
        let weights = MetricWeights::default();
        let scorer = PillarScorer::new(
            Normalizer::new(&bands, true, NormalizationMode::Standard),
            &weights,
        );
        let metrics = metrics(&[
            (Metric::EmissionIntensity, -40.0),
            (Metric::RenewablePct, 400.0),
            (Metric::WaterIntensity, -1.0),
            (Metric::WasteIntensity, -1.0),
        ]);
        let score = scorer.pillar(Pillar::Environmental, "steel", &metrics);
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_normalization_scores_raw_magnitudes() {
        let bands = bands();
        let weights = MetricWeights::default();
        let scorer = PillarScorer::new(
            Normalizer::new(&bands, true, NormalizationMode::Disabled),
            &weights,
        );
        let metrics = metrics(&[
            (Metric::EmissionIntensity, 8.0),
            (Metric::RenewablePct, 40.0),
            (Metric::WaterIntensity, 0.0),
            (Metric::WasteIntensity, 0.0),
        ]);
        let score = scorer.pillar(Pillar::Environmental, "steel", &metrics);
        assert!((score - 1200.0).abs() < 1e-9);
    }
}
