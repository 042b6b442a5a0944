use super::knn::{self, KnnParams};
use super::ranking::rank_by_final_score;
use super::{percent_label, ScenarioKind, ScenarioResult, VariantDetail};
use crate::scoring::{RawMetric, ScoredBatch, ScoringEngine, SupplierRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Industry (or global) band average.
    Mean,
    /// Mean of the k nearest suppliers reporting the metric.
    NearestNeighbours,
}

impl ImputationStrategy {
    const ALL: [ImputationStrategy; 2] = [Self::Mean, Self::NearestNeighbours];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::NearestNeighbours => "KNN",
        }
    }
}

/// A collection with the same share of values blanked from every supplier.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MaskedCollection {
    pub(crate) records: Vec<SupplierRecord>,
    pub(crate) blanked: usize,
}

/// S3: for every rate, blank values at random and re-score the same masked
/// collection under both imputation strategies.
pub(super) fn run(
    engine: &ScoringEngine,
    suppliers: &[SupplierRecord],
    rates: &[f64],
    knn_params: &KnnParams,
    seed: u64,
) -> Vec<ScenarioResult> {
    let variants: Vec<(usize, f64, ImputationStrategy)> = rates
        .iter()
        .enumerate()
        .flat_map(|(index, rate)| {
            ImputationStrategy::ALL
                .into_iter()
                .map(move |strategy| (index, *rate, strategy))
        })
        .collect();

    let masked: Vec<MaskedCollection> = rates
        .par_iter()
        .enumerate()
        .map(|(index, rate)| mask_collection(suppliers, *rate, seed, index))
        .collect();

    variants
        .into_par_iter()
        .map(|(index, rate, strategy)| {
            let collection = &masked[index];
            let batch: ScoredBatch = match strategy {
                ImputationStrategy::Mean => engine.score_all(&collection.records),
                ImputationStrategy::NearestNeighbours => {
                    let observations = knn::impute(engine, &collection.records, knn_params);
                    engine.score_observations(&collection.records, observations)
                }
            };

            ScenarioResult {
                scenario: ScenarioKind::Missingness,
                variant: format!("MCAR {}% + {}", percent_label(rate), strategy.label()),
                detail: VariantDetail::Missingness {
                    rate,
                    imputation: strategy,
                    seed,
                    blanked_values: collection.blanked,
                },
                settings: engine.settings().clone(),
                entries: rank_by_final_score(batch.scored),
                quality: batch.quality,
            }
        })
        .collect()
}

/// Each supplier draws from its own generator, seeded from the run seed, the
/// rate's position and the supplier's position, so masks are reproducible
/// regardless of how the work is scheduled.
pub(crate) fn mask_collection(
    suppliers: &[SupplierRecord],
    rate: f64,
    seed: u64,
    rate_index: usize,
) -> MaskedCollection {
    let masked: Vec<(SupplierRecord, usize)> = suppliers
        .par_iter()
        .enumerate()
        .map(|(supplier_index, record)| {
            let mut rng = StdRng::seed_from_u64(mix_seed(seed, rate_index, supplier_index));
            mask_record(record, rate, &mut rng)
        })
        .collect();

    let blanked: usize = masked.iter().map(|(_, count)| count).sum();
    MaskedCollection {
        records: masked.into_iter().map(|(record, _)| record).collect(),
        blanked,
    }
}

fn mask_record<R: Rng>(
    record: &SupplierRecord,
    rate: f64,
    rng: &mut R,
) -> (SupplierRecord, usize) {
    let mut masked = record.clone();
    let mut candidates: Vec<RawMetric> = record
        .metrics
        .keys()
        .copied()
        .filter(|metric| !metric.is_risk())
        .collect();

    let count = blank_count(rate, candidates.len());
    candidates.shuffle(rng);
    for metric in &candidates[..count] {
        masked.metrics.remove(metric);
    }
    (masked, count)
}

/// `round(rate × n)`, at least one value whenever the rate is positive.
fn blank_count(rate: f64, available: usize) -> usize {
    if available == 0 || rate <= 0.0 {
        return 0;
    }
    let target = (rate * available as f64).round() as usize;
    target.clamp(1, available)
}

fn mix_seed(seed: u64, rate_index: usize, supplier_index: usize) -> u64 {
    let mut value = seed
        ^ (rate_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (supplier_index as u64 + 1).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    // splitmix64 finaliser
    value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}
