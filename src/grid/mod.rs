//! Risk grids
//!
//! A risk grid is the externally curated calibration table that maps an
//! asset's price to its normalized risk value for one axis (fiat or
//! BTC-relative). Grids are validated once on construction and are
//! immutable afterwards; all lookups go through [`interpolate`].

pub mod interpolate;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::error::{Error, Result};

/// Normalized asset ticker (always upper case)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for Symbol {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which price denomination a grid is calibrated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskAxis {
    /// Price in fiat (USD)
    Fiat,
    /// Price denominated in BTC
    BtcRelative,
}

impl std::fmt::Display for RiskAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskAxis::Fiat => write!(f, "fiat"),
            RiskAxis::BtcRelative => write!(f, "btc_relative"),
        }
    }
}

impl std::str::FromStr for RiskAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fiat" | "usd" => Ok(RiskAxis::Fiat),
            "btc" | "btc_relative" | "btc-relative" => Ok(RiskAxis::BtcRelative),
            other => Err(Error::OutOfRangeInput(format!("unknown risk axis '{}'", other))),
        }
    }
}

/// One calibration point of a risk grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Normalized risk in [0, 1]
    pub risk: f64,
    /// Price at that risk, always > 0
    pub price: f64,
}

impl GridPoint {
    pub fn new(risk: f64, price: f64) -> Self {
        Self { risk, price }
    }
}

/// Validated price/risk calibration table for one symbol and axis
///
/// Points are strictly increasing in both risk and price. A grid with
/// fewer than two points cannot be constructed.
#[derive(Debug, Clone, Serialize)]
pub struct RiskGrid {
    symbol: Symbol,
    axis: RiskAxis,
    points: Vec<GridPoint>,
}

impl RiskGrid {
    /// Validate and build a grid. Points must already be in ascending order.
    pub fn new(symbol: Symbol, axis: RiskAxis, points: Vec<GridPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::invalid_grid(
                symbol.as_str(),
                axis,
                format!("need at least 2 points, got {}", points.len()),
            ));
        }

        for (i, point) in points.iter().enumerate() {
            if !point.risk.is_finite() || !(0.0..=1.0).contains(&point.risk) {
                return Err(Error::invalid_grid(
                    symbol.as_str(),
                    axis,
                    format!("point {} has risk {} outside [0, 1]", i, point.risk),
                ));
            }
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(Error::invalid_grid(
                    symbol.as_str(),
                    axis,
                    format!("point {} has non-positive price {}", i, point.price),
                ));
            }
        }

        for (i, pair) in points.windows(2).enumerate() {
            let (lo, hi) = (pair[0], pair[1]);
            if hi.price <= lo.price || hi.risk <= lo.risk {
                return Err(Error::invalid_grid(
                    symbol.as_str(),
                    axis,
                    format!(
                        "points {} and {} are not strictly increasing ({}, {}) -> ({}, {})",
                        i,
                        i + 1,
                        lo.risk,
                        lo.price,
                        hi.risk,
                        hi.price
                    ),
                ));
            }
        }

        Ok(Self {
            symbol,
            axis,
            points,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn axis(&self) -> RiskAxis {
        self.axis
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    /// Lowest calibrated point
    pub fn first(&self) -> GridPoint {
        self.points[0]
    }

    /// Highest calibrated point
    pub fn last(&self) -> GridPoint {
        self.points[self.points.len() - 1]
    }

    /// Calibrated price range (min, max)
    pub fn price_range(&self) -> (f64, f64) {
        (self.first().price, self.last().price)
    }
}
