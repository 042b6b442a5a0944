use crate::scoring::resolve::{observe, Observation};
use crate::scoring::{
    Direction, ImputationSource, Metric, MetricValue, NormalizationMode, Normalizer, ScoringEngine,
    SupplierRecord,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_NEIGHBOURS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "manhattan" | "l1" => Ok(Self::Manhattan),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnParams {
    pub k: usize,
    pub distance: DistanceMetric,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_NEIGHBOURS,
            distance: DistanceMetric::default(),
        }
    }
}

impl DistanceMetric {
    /// Distance over the shared coordinates, scaled by how many there are so
    /// suppliers with sparse overlap are not favoured.
    fn between(
        self,
        a: &BTreeMap<Metric, f64>,
        b: &BTreeMap<Metric, f64>,
        skip: Metric,
    ) -> Option<f64> {
        let deltas: Vec<f64> = a
            .iter()
            .filter(|(metric, _)| **metric != skip)
            .filter_map(|(metric, left)| b.get(metric).map(|right| left - right))
            .collect();
        if deltas.is_empty() {
            return None;
        }

        let shared = deltas.len() as f64;
        Some(match self {
            Self::Euclidean => (deltas.iter().map(|d| d * d).sum::<f64>() / shared).sqrt(),
            Self::Manhattan => deltas.iter().map(|d| d.abs()).sum::<f64>() / shared,
        })
    }
}

/// Observes every supplier and fills gaps from the `k` nearest suppliers that
/// report the missing metric. Similarity is measured on normalized values of
/// the metrics both suppliers report. Gaps with no usable neighbour stay
/// absent and fall through to band-average imputation.
pub fn impute(
    engine: &ScoringEngine,
    records: &[SupplierRecord],
    params: &KnnParams,
) -> Vec<Observation> {
    let observations: Vec<Observation> = records.par_iter().map(observe).collect();

    let normalizer = Normalizer::new(
        engine.bands(),
        engine.settings().use_industry_bands,
        NormalizationMode::Standard,
    );
    let coordinates: Vec<BTreeMap<Metric, f64>> = records
        .par_iter()
        .zip(observations.par_iter())
        .map(|(record, observation)| {
            observation
                .metrics
                .values
                .iter()
                .filter(|(_, value)| value.is_present())
                .filter_map(|(metric, value)| {
                    value
                        .value()
                        .map(|raw| (*metric, normalizer.normalize(&record.industry, *metric, raw)))
                })
                .collect()
        })
        .collect();

    (0..observations.len())
        .into_par_iter()
        .map(|target| {
            let mut observation = observations[target].clone();
            for (metric, value) in observation.metrics.values.iter_mut() {
                if *value != MetricValue::Absent {
                    continue;
                }
                if let Some(imputed) =
                    neighbour_value(*metric, target, &observations, &coordinates, params)
                {
                    *value = MetricValue::Imputed {
                        value: imputed,
                        source: ImputationSource::NearestNeighbours,
                    };
                }
            }
            observation
        })
        .collect()
}

fn neighbour_value(
    metric: Metric,
    target: usize,
    observations: &[Observation],
    coordinates: &[BTreeMap<Metric, f64>],
    params: &KnnParams,
) -> Option<f64> {
    let mut candidates: Vec<(f64, usize, f64)> = observations
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != target)
        .filter_map(|(index, observation)| match observation.metrics.get(metric) {
            MetricValue::Present { value } => {
                let distance =
                    params
                        .distance
                        .between(&coordinates[target], &coordinates[index], metric)?;
                Some((distance, index, value))
            }
            _ => None,
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.truncate(params.k);

    let total: f64 = candidates.iter().map(|(_, _, value)| value).sum();
    let mean = total / candidates.len() as f64;
    Some(match metric.direction() {
        // majority vote for flags
        Direction::Boolean => {
            if mean >= 0.5 {
                1.0
            } else {
                0.0
            }
        }
        _ => mean,
    })
}
