use serde::{Deserialize, Serialize};
use std::fmt;

/// The three pillars blended into the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Environmental,
    Social,
    Governance,
}

impl Pillar {
    pub const ALL: [Pillar; 3] = [Pillar::Environmental, Pillar::Social, Pillar::Governance];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Environmental => "Environmental",
            Self::Social => "Social",
            Self::Governance => "Governance",
        }
    }

    pub fn metrics(self) -> [Metric; 4] {
        match self {
            Self::Environmental => [
                Metric::EmissionIntensity,
                Metric::RenewablePct,
                Metric::WaterIntensity,
                Metric::WasteIntensity,
            ],
            Self::Social => [
                Metric::InjuryRate,
                Metric::TrainingHours,
                Metric::WageRatio,
                Metric::DiversityPct,
            ],
            Self::Governance => [
                Metric::BoardDiversity,
                Metric::BoardIndependence,
                Metric::AntiCorruption,
                Metric::TransparencyScore,
            ],
        }
    }
}

impl std::str::FromStr for Pillar {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "environmental" | "e" => Ok(Self::Environmental),
            "social" | "s" => Ok(Self::Social),
            "governance" | "g" => Ok(Self::Governance),
            other => Err(format!("unknown pillar '{other}'")),
        }
    }
}

/// How a metric's raw value maps onto the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
    Parity,
    Boolean,
}

/// Scored metrics, after intensity metrics have been divided by revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    EmissionIntensity,
    RenewablePct,
    WaterIntensity,
    WasteIntensity,
    InjuryRate,
    TrainingHours,
    WageRatio,
    DiversityPct,
    BoardDiversity,
    BoardIndependence,
    AntiCorruption,
    TransparencyScore,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::EmissionIntensity,
        Metric::RenewablePct,
        Metric::WaterIntensity,
        Metric::WasteIntensity,
        Metric::InjuryRate,
        Metric::TrainingHours,
        Metric::WageRatio,
        Metric::DiversityPct,
        Metric::BoardDiversity,
        Metric::BoardIndependence,
        Metric::AntiCorruption,
        Metric::TransparencyScore,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::EmissionIntensity => "emission_intensity",
            Self::RenewablePct => "renewable_pct",
            Self::WaterIntensity => "water_intensity",
            Self::WasteIntensity => "waste_intensity",
            Self::InjuryRate => "injury_rate",
            Self::TrainingHours => "training_hours",
            Self::WageRatio => "wage_ratio",
            Self::DiversityPct => "diversity_pct",
            Self::BoardDiversity => "board_diversity",
            Self::BoardIndependence => "board_independence",
            Self::AntiCorruption => "anti_corruption",
            Self::TransparencyScore => "transparency_score",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|metric| metric.key() == key)
    }

    pub const fn pillar(self) -> Pillar {
        match self {
            Self::EmissionIntensity
            | Self::RenewablePct
            | Self::WaterIntensity
            | Self::WasteIntensity => Pillar::Environmental,
            Self::InjuryRate | Self::TrainingHours | Self::WageRatio | Self::DiversityPct => {
                Pillar::Social
            }
            Self::BoardDiversity
            | Self::BoardIndependence
            | Self::AntiCorruption
            | Self::TransparencyScore => Pillar::Governance,
        }
    }

    pub const fn direction(self) -> Direction {
        match self {
            Self::EmissionIntensity | Self::WaterIntensity | Self::WasteIntensity => {
                Direction::LowerIsBetter
            }
            Self::InjuryRate => Direction::LowerIsBetter,
            Self::WageRatio => Direction::Parity,
            Self::AntiCorruption => Direction::Boolean,
            Self::RenewablePct
            | Self::TrainingHours
            | Self::DiversityPct
            | Self::BoardDiversity
            | Self::BoardIndependence
            | Self::TransparencyScore => Direction::HigherIsBetter,
        }
    }

    /// Whether normalization or imputation needs a {min, avg, max} band.
    pub const fn is_banded(self) -> bool {
        !matches!(self, Self::AntiCorruption)
    }

    /// Intensity metrics are raw totals divided by revenue.
    pub const fn intensity_source(self) -> Option<RawMetric> {
        match self {
            Self::EmissionIntensity => Some(RawMetric::Emissions),
            Self::WaterIntensity => Some(RawMetric::WaterUsage),
            Self::WasteIntensity => Some(RawMetric::WasteGenerated),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Risk inputs feeding the risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMetric {
    Climate,
    Geopolitical,
    LaborDispute,
}

impl RiskMetric {
    pub const ALL: [RiskMetric; 3] = [
        RiskMetric::Climate,
        RiskMetric::Geopolitical,
        RiskMetric::LaborDispute,
    ];

    pub const fn raw(self) -> RawMetric {
        match self {
            Self::Climate => RawMetric::ClimateRisk,
            Self::Geopolitical => RawMetric::GeopoliticalRisk,
            Self::LaborDispute => RawMetric::LaborDisputeRisk,
        }
    }
}

/// Keys accepted in a supplier record's raw metric map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawMetric {
    Emissions,
    WaterUsage,
    WasteGenerated,
    RenewablePct,
    InjuryRate,
    TrainingHours,
    WageRatio,
    LowestWage,
    LivingWage,
    DiversityPct,
    BoardDiversity,
    BoardIndependence,
    AntiCorruption,
    TransparencyScore,
    ClimateRisk,
    GeopoliticalRisk,
    LaborDisputeRisk,
}

impl RawMetric {
    pub const ALL: [RawMetric; 17] = [
        RawMetric::Emissions,
        RawMetric::WaterUsage,
        RawMetric::WasteGenerated,
        RawMetric::RenewablePct,
        RawMetric::InjuryRate,
        RawMetric::TrainingHours,
        RawMetric::WageRatio,
        RawMetric::LowestWage,
        RawMetric::LivingWage,
        RawMetric::DiversityPct,
        RawMetric::BoardDiversity,
        RawMetric::BoardIndependence,
        RawMetric::AntiCorruption,
        RawMetric::TransparencyScore,
        RawMetric::ClimateRisk,
        RawMetric::GeopoliticalRisk,
        RawMetric::LaborDisputeRisk,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Emissions => "emissions",
            Self::WaterUsage => "water_usage",
            Self::WasteGenerated => "waste_generated",
            Self::RenewablePct => "renewable_pct",
            Self::InjuryRate => "injury_rate",
            Self::TrainingHours => "training_hours",
            Self::WageRatio => "wage_ratio",
            Self::LowestWage => "lowest_wage",
            Self::LivingWage => "living_wage",
            Self::DiversityPct => "diversity_pct",
            Self::BoardDiversity => "board_diversity",
            Self::BoardIndependence => "board_independence",
            Self::AntiCorruption => "anti_corruption",
            Self::TransparencyScore => "transparency_score",
            Self::ClimateRisk => "climate_risk",
            Self::GeopoliticalRisk => "geopolitical_risk",
            Self::LaborDisputeRisk => "labor_dispute_risk",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|metric| metric.key() == key)
    }

    pub const fn is_risk(self) -> bool {
        matches!(
            self,
            Self::ClimateRisk | Self::GeopoliticalRisk | Self::LaborDisputeRisk
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_belongs_to_exactly_one_pillar() {
        for metric in Metric::ALL {
            let owners = Pillar::ALL
                .iter()
                .filter(|pillar| pillar.metrics().contains(&metric))
                .count();
            assert_eq!(owners, 1, "{metric} should have one pillar");
            assert!(metric.pillar().metrics().contains(&metric));
        }
    }

    #[test]
    fn keys_round_trip_through_lookup() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        for raw in RawMetric::ALL {
            assert_eq!(RawMetric::from_key(raw.key()), Some(raw));
        }
        assert_eq!(Metric::from_key("carbon"), None);
    }

    #[test]
    fn only_anti_corruption_skips_bands() {
        let unbanded: Vec<_> = Metric::ALL.into_iter().filter(|m| !m.is_banded()).collect();
        assert_eq!(unbanded, vec![Metric::AntiCorruption]);
    }
}
