use super::ranking::rank_by_final_score;
use super::{ScenarioKind, ScenarioResult, VariantDetail};
use crate::scoring::{NormalizationMode, ScoringEngine, SupplierRecord};
use rayon::prelude::*;

const VARIANTS: [(NormalizationMode, &str); 2] = [
    (NormalizationMode::Disabled, "normalization off"),
    (NormalizationMode::Standard, "normalization on"),
];

/// S4: the same collection scored with raw magnitudes and with the standard
/// normalized path.
pub(super) fn run(engine: &ScoringEngine, suppliers: &[SupplierRecord]) -> Vec<ScenarioResult> {
    VARIANTS
        .par_iter()
        .map(|(normalization, label)| {
            let batch = engine
                .with_normalization(*normalization)
                .score_all(suppliers);

            ScenarioResult {
                scenario: ScenarioKind::Ablation,
                variant: label.to_string(),
                detail: VariantDetail::Ablation {
                    normalization: *normalization,
                },
                settings: engine.settings().clone(),
                entries: rank_by_final_score(batch.scored),
                quality: batch.quality,
            }
        })
        .collect()
}
