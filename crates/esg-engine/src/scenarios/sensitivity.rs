use super::ranking::rank_by_final_score;
use super::{ScenarioKind, ScenarioResult, VariantDetail, WEIGHT_PERTURBATIONS};
use crate::scoring::{ConfigurationError, Pillar, ScoringEngine, SupplierRecord};
use rayon::prelude::*;

/// S2: one full re-score per perturbation of the target pillar's weight.
pub(super) fn run(
    engine: &ScoringEngine,
    suppliers: &[SupplierRecord],
    pillar: Pillar,
) -> Result<Vec<ScenarioResult>, ConfigurationError> {
    WEIGHT_PERTURBATIONS
        .par_iter()
        .map(|delta| {
            let pillar_weights = engine.settings().pillar_weights.perturbed(pillar, *delta);
            let perturbed =
                engine.with_settings(engine.settings().with_pillar_weights(pillar_weights))?;
            let batch = perturbed.score_all(suppliers);

            Ok(ScenarioResult {
                scenario: ScenarioKind::Sensitivity,
                variant: variant_label(*delta),
                detail: VariantDetail::Sensitivity {
                    pillar,
                    delta: *delta,
                    pillar_weights,
                },
                settings: perturbed.settings().clone(),
                entries: rank_by_final_score(batch.scored),
                quality: batch.quality,
            })
        })
        .collect()
}

fn variant_label(delta: f64) -> String {
    format!("{:+}% weights", (delta * 100.0).round() as i64)
}
