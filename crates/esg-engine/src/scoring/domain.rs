use super::metrics::{Metric, RawMetric};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Raw metric payload: most metrics are numeric, anti-corruption is a flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
}

impl RawValue {
    pub fn as_number(self) -> f64 {
        match self {
            RawValue::Number(value) => value,
            RawValue::Flag(true) => 1.0,
            RawValue::Flag(false) => 0.0,
        }
    }

    pub fn as_flag(self) -> bool {
        match self {
            RawValue::Flag(flag) => flag,
            RawValue::Number(value) => value != 0.0,
        }
    }
}

/// Immutable supplier input. Absent metrics are missing keys, never zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub industry: String,
    #[serde(default)]
    pub revenue: Option<f64>,
    /// Profit margin as a fraction (0.12 = 12%), used by the utility scenario.
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default, deserialize_with = "skip_null_metrics")]
    pub metrics: BTreeMap<RawMetric, RawValue>,
}

impl SupplierRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        country: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: country.into(),
            industry: industry.into(),
            revenue: None,
            profit_margin: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn with_profit_margin(mut self, margin: f64) -> Self {
        self.profit_margin = Some(margin);
        self
    }

    pub fn with_metric(mut self, metric: RawMetric, value: f64) -> Self {
        self.metrics.insert(metric, RawValue::Number(value));
        self
    }

    pub fn with_flag(mut self, metric: RawMetric, flag: bool) -> Self {
        self.metrics.insert(metric, RawValue::Flag(flag));
        self
    }

    pub fn number(&self, metric: RawMetric) -> Option<f64> {
        self.metrics
            .get(&metric)
            .map(|value| value.as_number())
            .filter(|value| value.is_finite())
    }

    pub fn flag(&self, metric: RawMetric) -> Option<bool> {
        self.metrics.get(&metric).map(|value| value.as_flag())
    }

    /// Revenue usable as an intensity denominator.
    pub fn positive_revenue(&self) -> Option<f64> {
        self.revenue.filter(|revenue| revenue.is_finite() && *revenue > 0.0)
    }
}

fn skip_null_metrics<'de, D>(deserializer: D) -> Result<BTreeMap<RawMetric, RawValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<RawMetric, Option<RawValue>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(metric, value)| value.map(|value| (metric, value)))
        .collect())
}

/// Where an imputed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationSource {
    IndustryAverage,
    GlobalAverage,
    NearestNeighbours,
    PolicyDefault,
}

/// A scored metric's value with its provenance kept separate from the number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MetricValue {
    Present { value: f64 },
    Imputed { value: f64, source: ImputationSource },
    Absent,
}

impl MetricValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Present { value } | MetricValue::Imputed { value, .. } => Some(*value),
            MetricValue::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, MetricValue::Present { .. })
    }
}

/// Per-supplier metric values after intensity derivation and imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetrics {
    pub values: BTreeMap<Metric, MetricValue>,
}

impl ResolvedMetrics {
    pub fn get(&self, metric: Metric) -> MetricValue {
        self.values
            .get(&metric)
            .copied()
            .unwrap_or(MetricValue::Absent)
    }

    pub fn imputed(&self) -> Vec<Metric> {
        self.values
            .iter()
            .filter(|(_, value)| matches!(value, MetricValue::Imputed { .. }))
            .map(|(metric, _)| *metric)
            .collect()
    }
}

/// Risk classification derived from the risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn classify(risk_factor: f64) -> Self {
        if risk_factor < 0.2 {
            Self::Low
        } else if risk_factor < 0.4 {
            Self::Medium
        } else if risk_factor < 0.6 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

/// Output of one scoring pass over one supplier. Recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSupplier {
    pub supplier_id: String,
    pub name: String,
    pub industry: String,
    pub environmental: f64,
    pub social: f64,
    pub governance: f64,
    pub composite: f64,
    pub risk_factor: f64,
    pub risk_level: RiskLevel,
    pub risk_penalty: f64,
    pub completeness_ratio: f64,
    pub completeness_capped: bool,
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imputed_metrics: Vec<Metric>,
}
