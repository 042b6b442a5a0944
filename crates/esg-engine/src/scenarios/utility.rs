use super::ranking::assign_ranks;
use super::{percent_label, ScenarioKind, ScenarioResult, VariantDetail};
use crate::scoring::resolve::observe;
use crate::scoring::{Metric, QualityReport, ScoringEngine, SupplierRecord};
use rayon::prelude::*;
use std::cmp::Ordering;

/// S1: suppliers meeting the margin floor, ordered by ascending emission
/// intensity. Suppliers below the floor (or without a margin) are left out
/// of the table rather than penalised in-score.
pub(super) fn run(
    engine: &ScoringEngine,
    suppliers: &[SupplierRecord],
    min_margin: f64,
) -> ScenarioResult {
    let (eligible, excluded): (Vec<&SupplierRecord>, Vec<&SupplierRecord>) = suppliers
        .iter()
        .partition(|record| meets_margin(record, min_margin));

    let mut candidates: Vec<(Option<f64>, _)> = eligible
        .par_iter()
        .map(|record| {
            let intensity = observe(record)
                .metrics
                .get(Metric::EmissionIntensity)
                .value();
            (intensity, engine.score(record))
        })
        .collect();

    candidates.sort_by(|(a, _), (b, _)| compare_intensity(*a, *b));

    let mut quality = QualityReport::default();
    let ordered = candidates
        .into_iter()
        .map(|(_, outcome)| {
            quality.record(outcome.warnings);
            outcome.scored
        })
        .collect();

    ScenarioResult {
        scenario: ScenarioKind::Utility,
        variant: format!("margin >= {}%", percent_label(min_margin)),
        detail: VariantDetail::Utility {
            min_margin,
            excluded: excluded.iter().map(|record| record.id.clone()).collect(),
        },
        settings: engine.settings().clone(),
        entries: assign_ranks(ordered),
        quality,
    }
}

fn meets_margin(record: &SupplierRecord, min_margin: f64) -> bool {
    record
        .profit_margin
        .filter(|margin| margin.is_finite())
        .is_some_and(|margin| margin >= min_margin)
}

// Known intensities first, lowest first; unknown intensities keep input order.
fn compare_intensity(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
