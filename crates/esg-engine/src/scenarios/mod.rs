//! Deterministic what-if analyses over a supplier collection.
//!
//! Every scenario is a stateless function of the supplier collection, the
//! baseline engine and its parameters. Variants inside a scenario are
//! independent and fan out across threads; results come back in a fixed
//! variant order so the same seed and inputs always yield the same tables.

mod ablation;
pub mod knn;
mod missingness;
pub mod ranking;
mod sensitivity;
mod utility;

pub use knn::{DistanceMetric, KnnParams};
pub use missingness::ImputationStrategy;
pub use ranking::{rank_by_final_score, RankedEntry};

use crate::scoring::{
    ConfigurationError, NormalizationMode, Pillar, PillarWeights, QualityReport, ScoringEngine,
    ScoringSettings, SupplierRecord,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MISSING_RATES: [f64; 2] = [0.05, 0.10];
pub const WEIGHT_PERTURBATIONS: [f64; 4] = [-0.20, -0.10, 0.10, 0.20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    #[serde(rename = "s1")]
    Utility,
    #[serde(rename = "s2")]
    Sensitivity,
    #[serde(rename = "s3")]
    Missingness,
    #[serde(rename = "s4")]
    Ablation,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Utility,
        ScenarioKind::Sensitivity,
        ScenarioKind::Missingness,
        ScenarioKind::Ablation,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Utility => "S1",
            Self::Sensitivity => "S2",
            Self::Missingness => "S3",
            Self::Ablation => "S4",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Utility => "s1",
            Self::Sensitivity => "s2",
            Self::Missingness => "s3",
            Self::Ablation => "s4",
        }
    }

}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioParameterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s1" | "utility" => Ok(Self::Utility),
            "s2" | "sensitivity" => Ok(Self::Sensitivity),
            "s3" | "missingness" => Ok(Self::Missingness),
            "s4" | "ablation" => Ok(Self::Ablation),
            _ => Err(ScenarioParameterError::UnsupportedKind(value.to_string())),
        }
    }
}

/// Rejected before any scoring work begins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioParameterError {
    #[error("unsupported scenario kind '{0}' (expected s1, s2, s3 or s4)")]
    UnsupportedKind(String),
    #[error("scenario s1 requires a minimum profit margin")]
    MissingMargin,
    #[error("minimum profit margin must be a fraction in [-1, 1] (got {0})")]
    InvalidMargin(f64),
    #[error("at least one missingness rate is required")]
    NoMissingRates,
    #[error("missingness rate must lie in (0, 1) (got {0})")]
    InvalidMissingRate(f64),
    #[error("nearest-neighbour imputation needs k >= 1")]
    InvalidNeighbours,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid scenario parameters: {0}")]
    Parameter(#[from] ScenarioParameterError),
    #[error("invalid scoring configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Caller-supplied knobs. Only the fields relevant to a scenario are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub seed: Option<u64>,
    /// Minimum profit margin as a fraction (0.10 = 10%). Required for s1.
    pub min_margin: Option<f64>,
    /// Pillar whose weight s2 perturbs. Defaults to environmental.
    pub target_pillar: Option<Pillar>,
    /// MCAR rates for s3. Defaults to 5% and 10%.
    pub missing_rates: Option<Vec<f64>>,
    /// Nearest-neighbour settings for s3; the runner's defaults otherwise.
    pub knn: Option<KnnParams>,
}

impl ScenarioParams {
    pub fn validate(&self, kind: ScenarioKind) -> Result<(), ScenarioParameterError> {
        match kind {
            ScenarioKind::Utility => {
                let margin = self.min_margin.ok_or(ScenarioParameterError::MissingMargin)?;
                if !(margin.is_finite() && (-1.0..=1.0).contains(&margin)) {
                    return Err(ScenarioParameterError::InvalidMargin(margin));
                }
            }
            ScenarioKind::Missingness => {
                let rates = self.missing_rates();
                if rates.is_empty() {
                    return Err(ScenarioParameterError::NoMissingRates);
                }
                if let Some(rate) = rates
                    .iter()
                    .copied()
                    .find(|rate| !(rate.is_finite() && *rate > 0.0 && *rate < 1.0))
                {
                    return Err(ScenarioParameterError::InvalidMissingRate(rate));
                }
                if self.knn.is_some_and(|knn| knn.k == 0) {
                    return Err(ScenarioParameterError::InvalidNeighbours);
                }
            }
            ScenarioKind::Sensitivity | ScenarioKind::Ablation => {}
        }
        Ok(())
    }

    pub fn missing_rates(&self) -> Vec<f64> {
        self.missing_rates
            .clone()
            .unwrap_or_else(|| DEFAULT_MISSING_RATES.to_vec())
    }

    pub fn target_pillar(&self) -> Pillar {
        self.target_pillar.unwrap_or(Pillar::Environmental)
    }
}

/// The perturbation or setting applied to produce a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantDetail {
    Utility {
        min_margin: f64,
        excluded: Vec<String>,
    },
    Sensitivity {
        pillar: Pillar,
        delta: f64,
        pillar_weights: PillarWeights,
    },
    Missingness {
        rate: f64,
        imputation: ImputationStrategy,
        seed: u64,
        blanked_values: usize,
    },
    Ablation {
        normalization: NormalizationMode,
    },
}

/// One ranked table plus the metadata needed to reproduce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub scenario: ScenarioKind,
    pub variant: String,
    pub detail: VariantDetail,
    pub settings: ScoringSettings,
    pub entries: Vec<RankedEntry>,
    pub quality: QualityReport,
}

/// All variants of one scenario invocation, in their fixed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRun {
    pub scenario: ScenarioKind,
    pub seed: u64,
    pub results: Vec<ScenarioResult>,
}

/// Dispatches scenarios against a baseline engine.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    engine: ScoringEngine,
    default_seed: u64,
    default_knn: KnnParams,
}

impl ScenarioRunner {
    pub fn new(engine: ScoringEngine) -> Self {
        Self {
            engine,
            default_seed: DEFAULT_SEED,
            default_knn: KnnParams::default(),
        }
    }

    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = seed;
        self
    }

    pub fn with_default_knn(mut self, knn: KnnParams) -> Self {
        self.default_knn = KnnParams {
            k: knn.k.max(1),
            ..knn
        };
        self
    }

    /// Same bands and defaults, different baseline settings.
    pub fn with_settings(&self, settings: ScoringSettings) -> Result<Self, ConfigurationError> {
        Ok(Self {
            engine: self.engine.with_settings(settings)?,
            ..self.clone()
        })
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn run(
        &self,
        kind: ScenarioKind,
        suppliers: &[SupplierRecord],
        params: &ScenarioParams,
    ) -> Result<ScenarioRun, ScenarioError> {
        params.validate(kind)?;
        let seed = params.seed.unwrap_or(self.default_seed);

        tracing::info!(
            scenario = kind.id(),
            suppliers = suppliers.len(),
            seed,
            "running scenario"
        );

        let results = match kind {
            ScenarioKind::Utility => {
                // validate() guarantees the margin is present
                let min_margin = params.min_margin.unwrap_or_default();
                vec![utility::run(&self.engine, suppliers, min_margin)]
            }
            ScenarioKind::Sensitivity => {
                sensitivity::run(&self.engine, suppliers, params.target_pillar())?
            }
            ScenarioKind::Missingness => missingness::run(
                &self.engine,
                suppliers,
                &params.missing_rates(),
                &params.knn.unwrap_or(self.default_knn),
                seed,
            ),
            ScenarioKind::Ablation => ablation::run(&self.engine, suppliers),
        };

        for result in &results {
            tracing::debug!(
                scenario = kind.id(),
                variant = %result.variant,
                ranked = result.entries.len(),
                warnings = result.quality.warnings.len(),
                "scenario variant finished"
            );
        }

        Ok(ScenarioRun {
            scenario: kind,
            seed,
            results,
        })
    }
}

/// Formats a fraction as a compact percentage: 0.05 -> "5", 0.125 -> "12.5".
pub(crate) fn percent_label(fraction: f64) -> String {
    let percent = fraction * 100.0;
    if (percent - percent.round()).abs() < 1e-9 {
        format!("{}", percent.round() as i64)
    } else {
        format!("{percent:.1}")
    }
}
