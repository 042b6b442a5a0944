use super::bands::BandRepository;
use super::metrics::{Direction, Metric};
use serde::{Deserialize, Serialize};

/// Lower edge of the extended wage-parity band.
pub const PARITY_FLOOR: f64 = 0.6;
/// Upper edge of the extended wage-parity band.
pub const PARITY_CEILING: f64 = 1.2;

/// `(max - clamp(x)) / (max - min)`, 0 for a degenerate band.
pub fn normalize_lower(x: f64, min: f64, max: f64) -> f64 {
    if !x.is_finite() || max <= min {
        return 0.0;
    }
    (max - x.clamp(min, max)) / (max - min)
}

/// `(clamp(x) - min) / (max - min)`, 0 for a degenerate band.
pub fn normalize_higher(x: f64, min: f64, max: f64) -> f64 {
    if !x.is_finite() || max <= min {
        return 0.0;
    }
    (x.clamp(min, max) - min) / (max - min)
}

/// Wage ratio at or above parity saturates; below it decays linearly across
/// the extended band and reaches 0 at the floor.
pub fn normalize_parity(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    ((x - PARITY_FLOOR) / (PARITY_CEILING - PARITY_FLOOR)).clamp(0.0, 1.0)
}

pub fn normalize_boolean(x: bool) -> f64 {
    if x {
        1.0
    } else {
        0.0
    }
}

/// Standard scoring normalizes; the ablation scenario passes raw values through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    #[default]
    Standard,
    Disabled,
}

/// Maps metric values onto [0, 1] using industry or global bands.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    bands: &'a BandRepository,
    use_industry_bands: bool,
    mode: NormalizationMode,
}

impl<'a> Normalizer<'a> {
    pub fn new(bands: &'a BandRepository, use_industry_bands: bool, mode: NormalizationMode) -> Self {
        Self {
            bands,
            use_industry_bands,
            mode,
        }
    }

    pub fn normalize(&self, industry: &str, metric: Metric, value: f64) -> f64 {
        if self.mode == NormalizationMode::Disabled {
            return value;
        }

        match metric.direction() {
            Direction::Parity => normalize_parity(value),
            Direction::Boolean => normalize_boolean(value >= 0.5),
            direction => {
                let Ok(resolved) = self
                    .bands
                    .bounds(industry, metric, self.use_industry_bands)
                else {
                    return 0.0;
                };
                let band = resolved.band;
                if direction == Direction::LowerIsBetter {
                    normalize_lower(value, band.min, band.max)
                } else {
                    normalize_higher(value, band.min, band.max)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::bands::IndustryBand;
    use proptest::prelude::*;

    #[test]
    fn lower_is_better_example() {
        let value = normalize_lower(2.5, 0.0, 10.0);
        assert!((value - 0.75).abs() < 1e-12);
        assert_eq!(normalize_lower(0.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize_lower(10.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn higher_is_better_endpoints() {
        assert_eq!(normalize_higher(0.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize_higher(10.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize_higher(25.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn degenerate_band_yields_zero() {
        assert_eq!(normalize_lower(3.0, 3.0, 3.0), 0.0);
        assert_eq!(normalize_higher(3.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn parity_uses_extended_band() {
        assert!((normalize_parity(0.8) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(normalize_parity(1.0), 1.0);
        assert_eq!(normalize_parity(1.4), 1.0);
        assert_eq!(normalize_parity(0.6), 0.0);
        assert_eq!(normalize_parity(0.3), 0.0);
    }

    #[test]
    fn disabled_mode_passes_raw_values_through() {
        let bands = BandRepository::from_industries(
            None,
            [(
                "textiles",
                vec![(
                    Metric::EmissionIntensity,
                    IndustryBand::new(0.0, 5.0, 10.0).expect("band"),
                )],
            )],
        )
        .expect("bands");

        let standard = Normalizer::new(&bands, true, NormalizationMode::Standard);
        let disabled = Normalizer::new(&bands, true, NormalizationMode::Disabled);
        assert_eq!(standard.normalize("textiles", Metric::EmissionIntensity, 40.0), 0.0);
        assert_eq!(disabled.normalize("textiles", Metric::EmissionIntensity, 40.0), 40.0);
        assert_eq!(standard.normalize("textiles", Metric::AntiCorruption, 1.0), 1.0);
    }

    proptest! {
        #[test]
        fn bounded_normalizers_stay_in_unit_interval(
            x in -1.0e6f64..1.0e6,
            min in -1.0e3f64..1.0e3,
            width in 0.0f64..1.0e3,
        ) {
            let max = min + width;
            let lower = normalize_lower(x, min, max);
            let higher = normalize_higher(x, min, max);
            prop_assert!((0.0..=1.0).contains(&lower));
            prop_assert!((0.0..=1.0).contains(&higher));
            prop_assert!((0.0..=1.0).contains(&normalize_parity(x)));
        }

        #[test]
        fn band_edges_map_to_unit_endpoints(min in -1.0e3f64..1.0e3, width in 0.001f64..1.0e3) {
            let max = min + width;
            prop_assert_eq!(normalize_lower(min, min, max), 1.0);
            prop_assert_eq!(normalize_lower(max, min, max), 0.0);
            prop_assert_eq!(normalize_higher(min, min, max), 0.0);
            prop_assert_eq!(normalize_higher(max, min, max), 1.0);
        }
    }
}
