//! Better-entry target search
//!
//! From the current band, walk outward toward the extreme on the same
//! side of neutral and stop at the first band whose coefficient is
//! strictly higher than the current one. Long signals walk toward band 0,
//! short signals toward band 9; neutral signals have no better target.

use serde::Serialize;
use tracing::debug;

use super::{score, ScoreResult, Signal};
use crate::bands::coefficient::coefficient_for_band;
use crate::bands::{Band, BandTable};
use crate::error::Result;
use crate::grid::RiskGrid;

/// A rarer band worth waiting for, with its price on the grid's axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSuggestion {
    pub target_band: Band,
    /// Representative risk of the target band (its midpoint)
    pub target_risk: f64,
    pub target_price: f64,
    pub target_coefficient: f64,
    pub target_score: f64,
    /// `target_score - current total_score`
    pub score_delta: f64,
}

/// Bands to visit, nearest first, for a signal direction
fn scan_path(current_band: Band, signal: Signal) -> Vec<Band> {
    let step: fn(&Band) -> Option<Band> = match signal {
        Signal::Long => Band::below,
        Signal::Short => Band::above,
        Signal::Neutral => return Vec::new(),
    };

    std::iter::successors(step(&current_band), step).collect()
}

/// Search for a strictly better neighbouring band.
///
/// Returns `Ok(None)` when the signal is neutral, when the current band is
/// already the extreme, or when no band on the way has a higher
/// coefficient.
pub fn suggest_target(
    grid: &RiskGrid,
    table: &BandTable,
    current_band: Band,
    current: &ScoreResult,
) -> Result<Option<TargetSuggestion>> {
    for band in scan_path(current_band, current.signal) {
        let coefficient = coefficient_for_band(table, band);
        if coefficient.value <= current.coefficient {
            continue;
        }

        let target_risk = band.midpoint();
        let target_price = grid.price_at_risk(target_risk)?;
        let target = score(target_risk, coefficient.value)?;

        debug!(
            symbol = %grid.symbol(),
            from = %current_band,
            to = %band,
            target_price,
            "Found better target band"
        );

        return Ok(Some(TargetSuggestion {
            target_band: band,
            target_risk,
            target_price,
            target_coefficient: coefficient.value,
            target_score: target.total_score,
            score_delta: target.total_score - current.total_score,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridPoint, RiskAxis, Symbol};

    fn grid() -> RiskGrid {
        RiskGrid::new(
            Symbol::new("ETH"),
            RiskAxis::Fiat,
            vec![
                GridPoint::new(0.0, 100.0),
                GridPoint::new(0.5, 2000.0),
                GridPoint::new(1.0, 6000.0),
            ],
        )
        .unwrap()
    }

    fn table() -> BandTable {
        // average 100; coefficients: band0 1.54, band1 1.3, band2 1.0, band3 1.0,
        // ..., band7 1.3, band8 1.42, band9 1.0 (no history)
        BandTable::new("ETH", &[10, 50, 100, 150, 230, 230, 150, 50, 30, 0], 1000).unwrap()
    }

    fn current(risk: f64, band: usize, table: &BandTable) -> (Band, ScoreResult) {
        let band = Band::from_index(band).unwrap();
        let coef = coefficient_for_band(table, band).value;
        (band, score(risk, coef).unwrap())
    }

    #[test]
    fn test_long_scans_toward_zero() {
        let table = table();
        let (band, now) = current(0.31, 3, &table);
        assert_eq!(now.signal, Signal::Long);

        let target = suggest_target(&grid(), &table, band, &now).unwrap().unwrap();
        // Band 2 ties at 1.0, band 1 is the first strictly better band
        assert_eq!(target.target_band.index(), 1);
        assert!(target.target_coefficient > now.coefficient);
        assert!((target.target_risk - 0.15).abs() < 1e-12);
        assert!((target.target_price - (100.0 + 0.3 * 1900.0)).abs() < 1e-9);

        // Midpoint 0.15 is in the 80-point zone
        assert!((target.target_score - 80.0 * 1.3).abs() < 1e-9);
        assert!((target.score_delta - (target.target_score - now.total_score)).abs() < 1e-12);
    }

    #[test]
    fn test_short_scans_toward_nine() {
        let table = table();
        let (band, now) = current(0.68, 6, &table);
        assert_eq!(now.signal, Signal::Short);

        let target = suggest_target(&grid(), &table, band, &now).unwrap().unwrap();
        assert_eq!(target.target_band.index(), 7);
        assert!(target.target_coefficient > now.coefficient);
    }

    #[test]
    fn test_no_target_from_neutral() {
        let table = table();
        let (band, now) = current(0.5, 5, &table);
        assert!(suggest_target(&grid(), &table, band, &now).unwrap().is_none());
    }

    #[test]
    fn test_no_target_at_extreme() {
        let table = table();
        let (band, now) = current(0.02, 0, &table);
        assert!(suggest_target(&grid(), &table, band, &now).unwrap().is_none());
    }

    #[test]
    fn test_no_target_when_nothing_rarer() {
        let table = table();
        // Band 8 (1.42) is rarer than band 9, which has no history and
        // degrades to 1.0, so nothing beyond band 8 is better.
        let (band, now) = current(0.88, 8, &table);
        assert!(suggest_target(&grid(), &table, band, &now).unwrap().is_none());
    }

    #[test]
    fn test_scan_path_order() {
        let path = scan_path(Band::from_index(3).unwrap(), Signal::Long);
        let indices: Vec<usize> = path.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![2, 1, 0]);

        let path = scan_path(Band::from_index(7).unwrap(), Signal::Short);
        let indices: Vec<usize> = path.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![8, 9]);

        assert!(scan_path(Band::from_index(4).unwrap(), Signal::Neutral).is_empty());
    }
}
