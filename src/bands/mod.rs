//! Risk bands and dwell-time tables
//!
//! The [0, 1] risk range is split into ten fixed 0.1-wide bands. Each
//! asset carries a [`BandTable`] recording how many days its risk value
//! has historically spent in each band.

pub mod coefficient;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of fixed-width risk bands
pub const BAND_COUNT: usize = 10;

/// Width of each risk band
pub const BAND_WIDTH: f64 = 0.1;

/// The two bands straddling the neutral midpoint (0.4-0.5 and 0.5-0.6)
pub const MIDDLE_BANDS: [Band; 2] = [Band(4), Band(5)];

/// One of the ten fixed risk bands.
///
/// Bands are half-open `[lower, upper)` except the last, which also
/// admits a risk of exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Band(u8);

impl Band {
    /// Band by index (0..=9)
    pub fn from_index(index: usize) -> Option<Self> {
        (index < BAND_COUNT).then(|| Band(index as u8))
    }

    /// Classify a risk value into its band
    pub fn for_risk(risk: f64) -> Result<Self> {
        if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
            return Err(Error::OutOfRangeInput(format!(
                "risk {} must be within [0, 1]",
                risk
            )));
        }

        // Compare against the same bounds `lower()` reports so that a risk
        // sitting exactly on an edge lands in the band that starts there.
        let band = Self::all()
            .find(|band| risk >= band.lower() && risk < band.upper())
            .unwrap_or(Band(BAND_COUNT as u8 - 1));
        Ok(band)
    }

    /// All bands from lowest to highest risk
    pub fn all() -> impl DoubleEndedIterator<Item = Band> {
        (0..BAND_COUNT as u8).map(Band)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn lower(&self) -> f64 {
        self.0 as f64 / BAND_COUNT as f64
    }

    pub fn upper(&self) -> f64 {
        (self.0 as f64 + 1.0) / BAND_COUNT as f64
    }

    /// Representative risk of the band
    pub fn midpoint(&self) -> f64 {
        (self.0 as f64 + 0.5) / BAND_COUNT as f64
    }

    pub fn is_last(&self) -> bool {
        self.index() == BAND_COUNT - 1
    }

    /// Neighbouring band in the direction of lower risk
    pub fn below(&self) -> Option<Band> {
        self.0.checked_sub(1).map(Band)
    }

    /// Neighbouring band in the direction of higher risk
    pub fn above(&self) -> Option<Band> {
        Band::from_index(self.index() + 1)
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}-{:.1}", self.lower(), self.upper())
    }
}

/// Quality flag attached to results derived from dwell-time history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "note")]
pub enum DataQuality {
    /// Enough history to compute the value normally
    Complete,
    /// A needed band has no recorded history; a documented default was used
    InsufficientHistory(String),
}

impl DataQuality {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DataQuality::InsufficientHistory(_))
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            DataQuality::Complete => None,
            DataQuality::InsufficientHistory(note) => Some(note),
        }
    }
}

/// Historical dwell time per band for one asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTable {
    dwell_days: [u32; BAND_COUNT],
    life_age_days: u32,
}

impl BandTable {
    /// Validate and build a band table.
    ///
    /// The dwell days of all bands may not exceed the asset's life age;
    /// days with no classified risk value are allowed to be missing.
    pub fn new(symbol: &str, dwell_days: &[u32], life_age_days: u32) -> Result<Self> {
        let dwell_days: [u32; BAND_COUNT] =
            dwell_days
                .try_into()
                .map_err(|_| Error::InvalidBandTable {
                    symbol: symbol.to_string(),
                    reason: format!(
                        "expected {} dwell-day entries, got {}",
                        BAND_COUNT,
                        dwell_days.len()
                    ),
                })?;

        let total: u64 = dwell_days.iter().map(|&d| d as u64).sum();
        if total > life_age_days as u64 {
            return Err(Error::InvalidBandTable {
                symbol: symbol.to_string(),
                reason: format!(
                    "dwell days sum to {} but life age is only {} days",
                    total, life_age_days
                ),
            });
        }

        Ok(Self {
            dwell_days,
            life_age_days,
        })
    }

    pub fn dwell_days_for(&self, band: Band) -> u32 {
        self.dwell_days[band.index()]
    }

    pub fn dwell_days(&self) -> &[u32; BAND_COUNT] {
        &self.dwell_days
    }

    pub fn life_age_days(&self) -> u32 {
        self.life_age_days
    }

    /// Days with a classified risk value
    pub fn classified_days(&self) -> u64 {
        self.dwell_days.iter().map(|&d| d as u64).sum()
    }

    /// Mean dwell time across all ten bands
    pub fn average_dwell_days(&self) -> f64 {
        self.classified_days() as f64 / BAND_COUNT as f64
    }

    /// Band the asset has spent the most days in (lowest index on ties)
    pub fn most_common_band(&self) -> Band {
        Band::all()
            .rev()
            .max_by_key(|band| self.dwell_days_for(*band))
            .unwrap_or(Band(0))
    }

    /// Share of the asset's life spent in a band (0.0 to 1.0)
    pub fn life_share(&self, band: Band) -> f64 {
        if self.life_age_days == 0 {
            return 0.0;
        }
        self.dwell_days_for(band) as f64 / self.life_age_days as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(Band::for_risk(0.0).unwrap().index(), 0);
        assert_eq!(Band::for_risk(0.0999).unwrap().index(), 0);
        assert_eq!(Band::for_risk(0.1).unwrap().index(), 1);
        assert_eq!(Band::for_risk(0.3).unwrap().index(), 3);
        assert_eq!(Band::for_risk(0.7).unwrap().index(), 7);
        assert_eq!(Band::for_risk(0.9).unwrap().index(), 9);
        assert_eq!(Band::for_risk(1.0).unwrap().index(), 9);
    }

    #[test]
    fn test_bands_partition_unit_interval() {
        for step in 0..=10_000 {
            let risk = step as f64 / 10_000.0;
            let band = Band::for_risk(risk).unwrap();
            let matching = Band::all()
                .filter(|b| risk >= b.lower() && (risk < b.upper() || (b.is_last() && risk <= 1.0)))
                .count();
            assert_eq!(matching, 1, "risk {} matched {} bands", risk, matching);
            assert!(risk >= band.lower());
        }
    }

    #[test]
    fn test_band_rejects_out_of_range() {
        assert!(Band::for_risk(-0.01).is_err());
        assert!(Band::for_risk(1.01).is_err());
        assert!(Band::for_risk(f64::NAN).is_err());
    }

    #[test]
    fn test_band_labels_and_neighbours() {
        let band = Band::from_index(4).unwrap();
        assert_eq!(band.to_string(), "0.4-0.5");
        assert!((band.midpoint() - 0.45).abs() < 1e-12);
        assert_eq!(band.below(), Band::from_index(3));
        assert_eq!(Band::from_index(0).unwrap().below(), None);
        assert_eq!(Band::from_index(9).unwrap().above(), None);
        assert!(Band::from_index(10).is_none());
    }

    #[test]
    fn test_band_table_validation() {
        let table =
            BandTable::new("ETH", &[10, 20, 30, 40, 50, 60, 70, 80, 90, 100], 600).unwrap();
        assert_eq!(table.classified_days(), 550);
        assert_eq!(table.average_dwell_days(), 55.0);
        assert_eq!(table.most_common_band().index(), 9);
        assert_eq!(table.dwell_days_for(Band::from_index(2).unwrap()), 30);

        let err = BandTable::new("ETH", &[10, 20, 30], 600).unwrap_err();
        assert!(matches!(err, Error::InvalidBandTable { .. }));

        let err = BandTable::new("ETH", &[100; 10], 999).unwrap_err();
        assert!(err.is_data_error());
    }

    #[test]
    fn test_most_common_band_ties_prefer_lowest() {
        let table = BandTable::new("ETH", &[5, 9, 9, 1, 0, 0, 0, 0, 0, 0], 30).unwrap();
        assert_eq!(table.most_common_band().index(), 1);
    }
}
