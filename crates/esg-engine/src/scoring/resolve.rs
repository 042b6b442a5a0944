use super::bands::{BandRepository, BandSource};
use super::domain::{ImputationSource, MetricValue, ResolvedMetrics, SupplierRecord};
use super::metrics::{Metric, RawMetric};
use super::quality::{DataQualityWarning, WarningKind};
use std::collections::BTreeMap;

/// Metric values as observed on the record, before any imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metrics: ResolvedMetrics,
    pub warnings: Vec<DataQualityWarning>,
}

/// Derives the scored metrics from a raw record. Values are either
/// `Present` or `Absent` here.
pub fn observe(record: &SupplierRecord) -> Observation {
    let mut values = BTreeMap::new();
    let mut skipped_intensity = Vec::new();
    let revenue = record.positive_revenue();

    for metric in Metric::ALL {
        let value = match metric.intensity_source() {
            Some(source) => match (record.number(source), revenue) {
                (Some(total), Some(revenue)) => Some(total / revenue),
                (Some(_), None) => {
                    skipped_intensity.push(metric);
                    None
                }
                (None, _) => None,
            },
            None => raw_value(record, metric),
        };

        let value = match value {
            Some(value) => MetricValue::Present { value },
            None => MetricValue::Absent,
        };
        values.insert(metric, value);
    }

    let mut warnings = Vec::new();
    if !skipped_intensity.is_empty() {
        warnings.push(DataQualityWarning::new(
            &record.id,
            WarningKind::ZeroRevenue {
                metrics: skipped_intensity,
            },
        ));
    }

    Observation {
        metrics: ResolvedMetrics { values },
        warnings,
    }
}

fn raw_value(record: &SupplierRecord, metric: Metric) -> Option<f64> {
    match metric {
        Metric::WageRatio => record.number(RawMetric::WageRatio).or_else(|| {
            let lowest = record.number(RawMetric::LowestWage)?;
            let living = record.number(RawMetric::LivingWage).filter(|wage| *wage > 0.0)?;
            Some(lowest / living)
        }),
        Metric::AntiCorruption => record
            .flag(RawMetric::AntiCorruption)
            .map(|flag| if flag { 1.0 } else { 0.0 }),
        Metric::RenewablePct => record.number(RawMetric::RenewablePct),
        Metric::InjuryRate => record.number(RawMetric::InjuryRate),
        Metric::TrainingHours => record.number(RawMetric::TrainingHours),
        Metric::DiversityPct => record.number(RawMetric::DiversityPct),
        Metric::BoardDiversity => record.number(RawMetric::BoardDiversity),
        Metric::BoardIndependence => record.number(RawMetric::BoardIndependence),
        Metric::TransparencyScore => record.number(RawMetric::TransparencyScore),
        Metric::EmissionIntensity | Metric::WaterIntensity | Metric::WasteIntensity => None,
    }
}

/// Fills every `Absent` value with the industry (or global) band average.
/// A missing anti-corruption flag is imputed as "no policy".
pub fn impute_means(
    metrics: &ResolvedMetrics,
    industry: &str,
    bands: &BandRepository,
    use_industry_bands: bool,
) -> ResolvedMetrics {
    let values = metrics
        .values
        .iter()
        .map(|(metric, value)| {
            let value = match value {
                MetricValue::Absent => mean_imputation(*metric, industry, bands, use_industry_bands),
                other => *other,
            };
            (*metric, value)
        })
        .collect();

    ResolvedMetrics { values }
}

fn mean_imputation(
    metric: Metric,
    industry: &str,
    bands: &BandRepository,
    use_industry_bands: bool,
) -> MetricValue {
    if !metric.is_banded() {
        return MetricValue::Imputed {
            value: 0.0,
            source: ImputationSource::PolicyDefault,
        };
    }

    match bands.bounds(industry, metric, use_industry_bands) {
        Ok(resolved) => MetricValue::Imputed {
            value: resolved.band.avg,
            source: match resolved.source {
                BandSource::Industry => ImputationSource::IndustryAverage,
                BandSource::Global => ImputationSource::GlobalAverage,
            },
        },
        Err(_) => MetricValue::Absent,
    }
}
