use super::error::ConfigurationError;
use super::metrics::Metric;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const GLOBAL_INDUSTRY: &str = "global";

/// {min, avg, max} bounds for one metric. Invariant: min <= avg <= max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndustryBand {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl IndustryBand {
    pub fn new(min: f64, avg: f64, max: f64) -> Result<Self, BandError> {
        let band = Self { min, avg, max };
        band.check(GLOBAL_INDUSTRY, "band")?;
        Ok(band)
    }

    fn check(&self, industry: &str, metric: &str) -> Result<(), BandError> {
        let finite = self.min.is_finite() && self.avg.is_finite() && self.max.is_finite();
        if !finite || self.min > self.avg || self.avg > self.max {
            return Err(BandError::InvalidBand {
                industry: industry.to_string(),
                metric: metric.to_string(),
                min: self.min,
                avg: self.avg,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Whether a band lookup hit the industry table or fell back to global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSource {
    Industry,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBand {
    pub band: IndustryBand,
    pub source: BandSource,
}

#[derive(Debug, thiserror::Error)]
pub enum BandError {
    #[error("failed to read bands document: {0}")]
    Io(#[from] std::io::Error),
    #[error("bands document is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown metric '{metric}' in bands for industry '{industry}'")]
    UnknownMetric { industry: String, metric: String },
    #[error(
        "band {industry}/{metric} violates min <= avg <= max (min {min}, avg {avg}, max {max})"
    )]
    InvalidBand {
        industry: String,
        metric: String,
        min: f64,
        avg: f64,
        max: f64,
    },
    #[error("no band for metric '{0}', not even a global fallback")]
    NotFound(Metric),
}

type IndustryTable = BTreeMap<String, BTreeMap<Metric, IndustryBand>>;

/// Read-only per-industry bands with a global fallback computed at load.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRepository {
    version: Option<String>,
    industries: IndustryTable,
    global: BTreeMap<Metric, IndustryBand>,
}

impl BandRepository {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BandError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Accepts `{ "version": .., "industries": {..} }` or a bare industry map.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BandError> {
        let document: Value = serde_json::from_reader(reader)?;
        let (version, industries) = match document {
            Value::Object(mut object) if object.contains_key("industries") => {
                let version = object
                    .remove("version")
                    .and_then(|value| value.as_str().map(str::to_string));
                let industries = object.remove("industries").unwrap_or(Value::Null);
                (version, industries)
            }
            other => (None, other),
        };

        let raw: BTreeMap<String, BTreeMap<String, IndustryBand>> =
            serde_json::from_value(industries)?;

        let mut table = IndustryTable::new();
        for (industry, metrics) in raw {
            let mut bands = BTreeMap::new();
            for (metric_key, band) in metrics {
                let metric =
                    Metric::from_key(&metric_key).ok_or_else(|| BandError::UnknownMetric {
                        industry: industry.clone(),
                        metric: metric_key.clone(),
                    })?;
                band.check(&industry, &metric_key)?;
                bands.insert(metric, band);
            }
            table
                .entry(industry_key(&industry))
                .or_default()
                .extend(bands);
        }

        let repository = Self::from_table(version, table);
        tracing::debug!(
            version = repository.version().unwrap_or("unversioned"),
            industries = repository.industries.len(),
            global_metrics = repository.global.len(),
            "bands loaded"
        );
        Ok(repository)
    }

    /// Builds a repository from already-validated bands keyed by industry.
    pub fn from_industries<I, S>(version: Option<String>, industries: I) -> Result<Self, BandError>
    where
        I: IntoIterator<Item = (S, Vec<(Metric, IndustryBand)>)>,
        S: AsRef<str>,
    {
        let mut table = IndustryTable::new();
        for (industry, bands) in industries {
            let entry = table.entry(industry_key(industry.as_ref())).or_default();
            for (metric, band) in bands {
                band.check(industry.as_ref(), metric.key())?;
                entry.insert(metric, band);
            }
        }
        Ok(Self::from_table(version, table))
    }

    fn from_table(version: Option<String>, mut industries: IndustryTable) -> Self {
        let explicit_global = industries.remove(GLOBAL_INDUSTRY).unwrap_or_default();
        let mut global = BTreeMap::new();

        for metric in Metric::ALL {
            if let Some(band) = explicit_global.get(&metric) {
                global.insert(metric, *band);
                continue;
            }

            let bands: Vec<&IndustryBand> = industries
                .values()
                .filter_map(|metrics| metrics.get(&metric))
                .collect();
            if bands.is_empty() {
                continue;
            }

            let min = bands.iter().map(|band| band.min).fold(f64::INFINITY, f64::min);
            let max = bands
                .iter()
                .map(|band| band.max)
                .fold(f64::NEG_INFINITY, f64::max);
            let avg = bands.iter().map(|band| band.avg).sum::<f64>() / bands.len() as f64;
            global.insert(metric, IndustryBand { min, avg, max });
        }

        Self {
            version,
            industries,
            global,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn industries(&self) -> impl Iterator<Item = &str> {
        self.industries.keys().map(String::as_str)
    }

    pub fn global(&self, metric: Metric) -> Option<IndustryBand> {
        self.global.get(&metric).copied()
    }

    /// Looks up the industry band, falling back to the global band when
    /// industry bands are disabled or the pair is unknown.
    pub fn bounds(
        &self,
        industry: &str,
        metric: Metric,
        use_industry_bands: bool,
    ) -> Result<ResolvedBand, BandError> {
        if use_industry_bands {
            let band = self
                .industries
                .get(&industry_key(industry))
                .and_then(|metrics| metrics.get(&metric));
            if let Some(band) = band {
                return Ok(ResolvedBand {
                    band: *band,
                    source: BandSource::Industry,
                });
            }
        }

        self.global(metric)
            .map(|band| ResolvedBand {
                band,
                source: BandSource::Global,
            })
            .ok_or(BandError::NotFound(metric))
    }

    /// Every banded metric needs a global fallback before scoring may start.
    pub fn ensure_global_coverage(&self) -> Result<(), ConfigurationError> {
        match Metric::ALL
            .into_iter()
            .filter(|metric| metric.is_banded())
            .find(|metric| !self.global.contains_key(metric))
        {
            Some(metric) => Err(ConfigurationError::MissingGlobalBand(metric)),
            None => Ok(()),
        }
    }
}

pub(crate) fn industry_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
