//! Reference data: per-asset grids and band tables
//!
//! Reference data is curated outside the engine and handed in as a
//! [`ReferenceSnapshot`]. The [`ReferenceStore`] keeps one immutable
//! [`AssetProfile`] per symbol behind an `Arc`; every calculation clones
//! the `Arc` once up front, so a refresh that swaps profiles never changes
//! the data a running calculation is looking at.

pub mod loader;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::bands::BandTable;
use crate::error::{Error, Result};
use crate::grid::{RiskAxis, RiskGrid, Symbol};

/// Everything the engine knows about one asset
#[derive(Debug, Clone)]
pub struct AssetProfile {
    pub symbol: Symbol,
    pub fiat_grid: RiskGrid,
    pub btc_grid: Option<RiskGrid>,
    pub bands: BandTable,
}

impl AssetProfile {
    /// Grid for an axis; the BTC-relative grid is optional
    pub fn grid(&self, axis: RiskAxis) -> Result<&RiskGrid> {
        match axis {
            RiskAxis::Fiat => Ok(&self.fiat_grid),
            RiskAxis::BtcRelative => self.btc_grid.as_ref().ok_or_else(|| Error::MissingAxis {
                symbol: self.symbol.to_string(),
                axis,
            }),
        }
    }

    pub fn has_axis(&self, axis: RiskAxis) -> bool {
        self.grid(axis).is_ok()
    }
}

/// Identity of a loaded reference data set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    /// Hex SHA-256 of the source document
    pub version: String,
    /// Date the curated data describes, if the source states one
    pub as_of: Option<NaiveDate>,
    pub loaded_at: DateTime<Utc>,
    pub asset_count: usize,
}

/// A complete, validated reference data set
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    pub info: SnapshotInfo,
    pub assets: Vec<AssetProfile>,
}

/// Shared, swappable store of asset profiles
#[derive(Debug, Default)]
pub struct ReferenceStore {
    profiles: DashMap<Symbol, Arc<AssetProfile>>,
    info: RwLock<Option<SnapshotInfo>>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a snapshot
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        let store = Self::new();
        store.install(snapshot);
        store
    }

    /// Replace the stored data with a new snapshot.
    ///
    /// Each symbol's profile is swapped in one step. Symbols missing from
    /// the new snapshot are dropped.
    pub fn install(&self, snapshot: ReferenceSnapshot) {
        let ReferenceSnapshot { info, assets } = snapshot;

        let incoming: Vec<Symbol> = assets.iter().map(|a| a.symbol.clone()).collect();
        for asset in assets {
            self.profiles.insert(asset.symbol.clone(), Arc::new(asset));
        }
        self.profiles.retain(|symbol, _| incoming.contains(symbol));

        info!(
            version = %info.version,
            assets = info.asset_count,
            "Installed reference snapshot"
        );

        match self.info.write() {
            Ok(mut guard) => *guard = Some(info),
            Err(poisoned) => *poisoned.into_inner() = Some(info),
        }
    }

    /// Immutable profile for a symbol, valid for the whole calculation
    pub fn profile(&self, symbol: &Symbol) -> Result<Arc<AssetProfile>> {
        self.profiles
            .get(symbol)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))
    }

    /// Known symbols in alphabetical order
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.profiles.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Info about the currently installed snapshot
    pub fn info(&self) -> Option<SnapshotInfo> {
        match self.info.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared test data
    use super::*;
    use crate::grid::GridPoint;

    pub fn grid(symbol: &str, axis: RiskAxis, raw: &[(f64, f64)]) -> RiskGrid {
        RiskGrid::new(
            Symbol::new(symbol),
            axis,
            raw.iter().map(|&(r, p)| GridPoint::new(r, p)).collect(),
        )
        .unwrap()
    }

    pub fn eth() -> AssetProfile {
        AssetProfile {
            symbol: Symbol::new("ETH"),
            fiat_grid: grid(
                "ETH",
                RiskAxis::Fiat,
                &[
                    (0.0, 100.0),
                    (0.1, 400.0),
                    (0.2, 800.0),
                    (0.3, 1200.0),
                    (0.4, 1600.0),
                    (0.5, 2000.0),
                    (0.6, 2500.0),
                    (0.7, 3000.0),
                    (0.8, 3600.0),
                    (0.9, 4300.0),
                    (1.0, 5000.0),
                ],
            ),
            btc_grid: Some(grid(
                "ETH",
                RiskAxis::BtcRelative,
                &[(0.0, 0.01), (0.5, 0.04), (1.0, 0.09)],
            )),
            // average 160
            bands: BandTable::new("ETH", &[16, 48, 160, 240, 320, 320, 240, 160, 80, 16], 1700)
                .unwrap(),
        }
    }

    pub fn sol() -> AssetProfile {
        AssetProfile {
            symbol: Symbol::new("SOL"),
            fiat_grid: grid("SOL", RiskAxis::Fiat, &[(0.0, 1.0), (0.5, 60.0), (1.0, 300.0)]),
            btc_grid: None,
            bands: BandTable::new("SOL", &[5, 30, 60, 90, 120, 120, 90, 60, 20, 5], 700).unwrap(),
        }
    }

    pub fn snapshot(assets: Vec<AssetProfile>, version: &str) -> ReferenceSnapshot {
        ReferenceSnapshot {
            info: SnapshotInfo {
                version: version.to_string(),
                as_of: None,
                loaded_at: Utc::now(),
                asset_count: assets.len(),
            },
            assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_profile_lookup() {
        let store = ReferenceStore::from_snapshot(snapshot(vec![eth(), sol()], "v1"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.symbols(), vec![Symbol::new("ETH"), Symbol::new("SOL")]);

        let eth = store.profile(&Symbol::new("eth")).unwrap();
        assert!(eth.has_axis(RiskAxis::BtcRelative));

        let err = store.profile(&Symbol::new("DOGE")).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(_)));
    }

    #[test]
    fn test_missing_btc_axis() {
        let sol = sol();
        let err = sol.grid(RiskAxis::BtcRelative).unwrap_err();
        assert!(matches!(err, Error::MissingAxis { .. }));
        assert!(sol.grid(RiskAxis::Fiat).is_ok());
    }

    #[test]
    fn test_install_swaps_without_touching_held_profiles() {
        let store = ReferenceStore::from_snapshot(snapshot(vec![eth(), sol()], "v1"));
        let held = store.profile(&Symbol::new("ETH")).unwrap();

        let mut updated = eth();
        updated.fiat_grid = grid("ETH", RiskAxis::Fiat, &[(0.0, 500.0), (1.0, 9000.0)]);
        store.install(snapshot(vec![updated], "v2"));

        // The calculation holding the old Arc still sees the old grid
        assert_eq!(held.fiat_grid.price_range(), (100.0, 5000.0));
        let fresh = store.profile(&Symbol::new("ETH")).unwrap();
        assert_eq!(fresh.fiat_grid.price_range(), (500.0, 9000.0));

        // SOL was not in v2
        assert!(store.profile(&Symbol::new("SOL")).is_err());
        assert_eq!(store.info().unwrap().version, "v2");
    }
}
