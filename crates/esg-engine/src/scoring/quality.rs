use super::metrics::{Metric, RiskMetric};
use serde::Serialize;

/// Recoverable per-supplier data issue. Recorded, never thrown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityWarning {
    pub supplier_id: String,
    #[serde(flatten)]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// Intensity metrics skipped because revenue is zero or absent.
    ZeroRevenue { metrics: Vec<Metric> },
    /// Missing risk inputs assumed at the neutral level.
    RiskDefaulted { metrics: Vec<RiskMetric> },
    /// Final score clamped by the completeness safeguard.
    CompletenessCapped { ratio: f64 },
}

impl DataQualityWarning {
    pub fn new(supplier_id: &str, kind: WarningKind) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            kind,
        }
    }

    pub fn summary(&self) -> String {
        match &self.kind {
            WarningKind::ZeroRevenue { metrics } => format!(
                "{}: revenue missing or zero, {} intensity metric(s) treated as missing",
                self.supplier_id,
                metrics.len()
            ),
            WarningKind::RiskDefaulted { metrics } => format!(
                "{}: {} risk metric(s) defaulted to neutral risk",
                self.supplier_id,
                metrics.len()
            ),
            WarningKind::CompletenessCapped { ratio } => format!(
                "{}: completeness {:.0}% below threshold, final score capped",
                self.supplier_id,
                ratio * 100.0
            ),
        }
    }
}

/// Aggregated data-quality findings for one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub suppliers_scored: usize,
    pub capped_suppliers: usize,
    pub warnings: Vec<DataQualityWarning>,
}

impl QualityReport {
    pub fn record(&mut self, warnings: impl IntoIterator<Item = DataQualityWarning>) {
        self.suppliers_scored += 1;
        for warning in warnings {
            if matches!(warning.kind, WarningKind::CompletenessCapped { .. }) {
                self.capped_suppliers += 1;
            }
            self.warnings.push(warning);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
