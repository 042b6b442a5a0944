use crate::scoring::ScoredSupplier;
use serde::Serialize;

/// A scored supplier at its 1-based position in a ranked table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub supplier: ScoredSupplier,
}

/// Sorts descending by final score. The sort is stable, so identical scores
/// keep their input order.
pub fn rank_by_final_score(scored: Vec<ScoredSupplier>) -> Vec<RankedEntry> {
    let mut scored = scored;
    scored.sort_by(|a, b| sort_key(b.final_score).total_cmp(&sort_key(a.final_score)));
    assign_ranks(scored)
}

pub(crate) fn assign_ranks(ordered: Vec<ScoredSupplier>) -> Vec<RankedEntry> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, supplier)| RankedEntry {
            rank: index + 1,
            supplier,
        })
        .collect()
}

// Folds -0.0 into 0.0 and sinks NaN so the comparison is a total order.
fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score + 0.0
    }
}
