//! Scarcity coefficient per risk band
//!
//! Bands the asset rarely visits are rewarded with a multiplier above 1.0;
//! bands it sits in at least as often as average get no edge. The
//! multiplier scales linearly with how far the band's dwell time falls
//! below the asset's average dwell time:
//!
//! ```text
//! coefficient = 1.00 + 0.60 * clamp(1 - dwell / average, 0, 1)
//! ```

use serde::Serialize;
use tracing::warn;

use super::{Band, BandTable, DataQuality};

/// Coefficient for the most common bands
pub const MIN_COEFFICIENT: f64 = 1.00;

/// Upper bound approached by bands with almost no history
pub const MAX_COEFFICIENT: f64 = 1.60;

/// Scoring multiplier for one band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub band: Band,
    pub value: f64,
    pub dwell_days: u32,
    pub quality: DataQuality,
}

impl Coefficient {
    fn degraded(band: Band, dwell_days: u32, note: String) -> Self {
        Self {
            band,
            value: MIN_COEFFICIENT,
            dwell_days,
            quality: DataQuality::InsufficientHistory(note),
        }
    }
}

/// Compute the scarcity coefficient of `band` for the asset described by
/// `table`.
///
/// A band with no recorded days (or an asset with no classified days at
/// all) cannot be rated and falls back to [`MIN_COEFFICIENT`] with an
/// explanatory note.
pub fn coefficient_for_band(table: &BandTable, band: Band) -> Coefficient {
    let dwell_days = table.dwell_days_for(band);
    let average = table.average_dwell_days();

    if average <= 0.0 {
        warn!(band = %band, "No classified dwell history, using neutral coefficient");
        return Coefficient::degraded(
            band,
            dwell_days,
            "no classified dwell history for this asset".to_string(),
        );
    }

    if dwell_days == 0 {
        warn!(band = %band, "Band has no dwell history, using neutral coefficient");
        return Coefficient::degraded(
            band,
            dwell_days,
            format!("band {} has no recorded dwell days", band),
        );
    }

    let scarcity = (1.0 - dwell_days as f64 / average).clamp(0.0, 1.0);
    let value = (MIN_COEFFICIENT + (MAX_COEFFICIENT - MIN_COEFFICIENT) * scarcity)
        .clamp(MIN_COEFFICIENT, MAX_COEFFICIENT);

    Coefficient {
        band,
        value,
        dwell_days,
        quality: DataQuality::Complete,
    }
}

/// Coefficients for all ten bands, lowest risk first
pub fn coefficient_ladder(table: &BandTable) -> Vec<Coefficient> {
    Band::all().map(|band| coefficient_for_band(table, band)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(i: usize) -> Band {
        Band::from_index(i).unwrap()
    }

    fn sample_table() -> BandTable {
        // Typical shape: little time at the extremes, most time mid-range
        BandTable::new("ETH", &[12, 85, 210, 363, 420, 291, 190, 96, 40, 8], 1800).unwrap()
    }

    #[test]
    fn test_most_common_band_has_no_edge() {
        let table = sample_table();
        let common = table.most_common_band();
        assert_eq!(common.index(), 4);
        assert_eq!(coefficient_for_band(&table, common).value, MIN_COEFFICIENT);
    }

    #[test]
    fn test_rare_band_rewarded() {
        let table = sample_table();
        // average = 1715 / 10 = 171.5; band 9 dwell 8 -> scarcity ~0.953
        let c = coefficient_for_band(&table, band(9));
        let expected = 1.0 + 0.6 * (1.0 - 8.0 / 171.5);
        assert!((c.value - expected).abs() < 1e-12);
        assert!(c.value > 1.5 && c.value <= MAX_COEFFICIENT);
        assert_eq!(c.quality, DataQuality::Complete);
    }

    #[test]
    fn test_coefficient_bounded_and_non_increasing_in_dwell() {
        let mut dwell: Vec<u32> = vec![1, 2, 5, 10, 20, 50, 100, 200, 400, 800];
        let total: u32 = dwell.iter().sum();
        let table = BandTable::new("SOL", &dwell, total).unwrap();

        let mut previous = f64::INFINITY;
        for i in 0..10 {
            let c = coefficient_for_band(&table, band(i));
            assert!((MIN_COEFFICIENT..=MAX_COEFFICIENT).contains(&c.value));
            assert!(c.value <= previous, "coefficient rose at band {}", i);
            previous = c.value;
        }

        // Same holds if we reverse the ordering of dwell times
        dwell.reverse();
        let table = BandTable::new("SOL", &dwell, total).unwrap();
        let ladder = coefficient_ladder(&table);
        for pair in ladder.windows(2) {
            assert!(pair[0].value <= pair[1].value);
        }
    }

    #[test]
    fn test_zero_dwell_degrades_to_neutral() {
        let table = BandTable::new("NEW", &[0, 0, 5, 10, 20, 20, 10, 0, 0, 0], 100).unwrap();
        let c = coefficient_for_band(&table, band(0));
        assert_eq!(c.value, MIN_COEFFICIENT);
        assert!(c.quality.is_degraded());
        assert!(c.quality.note().unwrap().contains("0.0-0.1"));
    }

    #[test]
    fn test_empty_history_degrades_to_neutral() {
        let table = BandTable::new("NEW", &[0; 10], 0).unwrap();
        for c in coefficient_ladder(&table) {
            assert_eq!(c.value, MIN_COEFFICIENT);
            assert!(c.quality.is_degraded());
        }
    }
}
