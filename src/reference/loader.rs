//! JSON reference data loader
//!
//! Expected document shape:
//!
//! ```json
//! {
//!   "as_of": "2025-01-15",
//!   "assets": [
//!     {
//!       "symbol": "ETH",
//!       "life_age_days": 3450,
//!       "dwell_days": [42, 180, 390, 520, 610, 540, 380, 220, 90, 28],
//!       "fiat_grid": [{ "risk": 0.0, "price": 80.0 }, { "risk": 1.0, "price": 7200.0 }],
//!       "btc_grid": [{ "risk": 0.0, "price": 0.012 }, { "risk": 1.0, "price": 0.088 }]
//!     }
//!   ]
//! }
//! ```
//!
//! Every asset is validated; a single bad asset rejects the whole document.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::{AssetProfile, ReferenceSnapshot, SnapshotInfo};
use crate::bands::BandTable;
use crate::error::{Error, Result};
use crate::grid::{GridPoint, RiskAxis, RiskGrid, Symbol};

#[derive(Debug, Deserialize)]
struct ReferenceDocument {
    #[serde(default)]
    as_of: Option<NaiveDate>,
    assets: Vec<AssetRecord>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    symbol: String,
    life_age_days: u32,
    dwell_days: Vec<u32>,
    fiat_grid: Vec<GridPoint>,
    #[serde(default)]
    btc_grid: Option<Vec<GridPoint>>,
}

impl AssetRecord {
    fn into_profile(self) -> Result<AssetProfile> {
        let symbol = Symbol::new(&self.symbol);
        if symbol.as_str().is_empty() {
            return Err(Error::ReferenceData("asset with empty symbol".to_string()));
        }

        let fiat_grid = RiskGrid::new(symbol.clone(), RiskAxis::Fiat, self.fiat_grid)?;
        let btc_grid = self
            .btc_grid
            .map(|points| RiskGrid::new(symbol.clone(), RiskAxis::BtcRelative, points))
            .transpose()?;
        let bands = BandTable::new(symbol.as_str(), &self.dwell_days, self.life_age_days)?;

        Ok(AssetProfile {
            symbol,
            fiat_grid,
            btc_grid,
            bands,
        })
    }
}

/// Parse and validate a reference document
pub fn parse_str(raw: &str) -> Result<ReferenceSnapshot> {
    let document: ReferenceDocument = serde_json::from_str(raw)
        .map_err(|e| Error::ReferenceData(format!("malformed reference document: {}", e)))?;

    let mut seen = HashSet::new();
    let mut assets = Vec::with_capacity(document.assets.len());
    for record in document.assets {
        let profile = record.into_profile()?;
        if !seen.insert(profile.symbol.clone()) {
            return Err(Error::ReferenceData(format!(
                "duplicate asset {}",
                profile.symbol
            )));
        }
        debug!(
            symbol = %profile.symbol,
            fiat_points = profile.fiat_grid.points().len(),
            has_btc_axis = profile.btc_grid.is_some(),
            "Validated asset"
        );
        assets.push(profile);
    }

    let version = format!("{:x}", Sha256::digest(raw.as_bytes()));

    Ok(ReferenceSnapshot {
        info: SnapshotInfo {
            version,
            as_of: document.as_of,
            loaded_at: Utc::now(),
            asset_count: assets.len(),
        },
        assets,
    })
}

/// Read, parse and validate a reference file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<ReferenceSnapshot> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::ReferenceData(format!("cannot read {}: {}", path.display(), e))
    })?;

    let snapshot = parse_str(&raw)?;
    let short_version = &snapshot.info.version[..12];
    info!(
        path = %path.display(),
        assets = snapshot.info.asset_count,
        version = short_version,
        "Loaded reference data"
    );
    Ok(snapshot)
}
