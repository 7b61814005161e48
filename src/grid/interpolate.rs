//! Piecewise-linear lookup over a risk grid
//!
//! Both directions bracket the input between two neighbouring grid points
//! and interpolate linearly. Inputs outside the calibrated range are
//! clamped, never extrapolated.

use tracing::debug;

use super::{GridPoint, RiskGrid};
use crate::error::{Error, Result};

impl RiskGrid {
    /// Normalized risk for a price.
    ///
    /// Prices below the grid's first point map to exactly `0.0`, prices
    /// above its last point to exactly `1.0`.
    pub fn risk_at_price(&self, price: f64) -> Result<f64> {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::OutOfRangeInput(format!(
                "price {} for {} must be a non-negative number",
                price, self.symbol
            )));
        }

        let (min, max) = self.price_range();
        if price < min {
            debug!(symbol = %self.symbol, axis = %self.axis, price, min, "Price below grid, clamping risk to 0");
            return Ok(0.0);
        }
        if price > max {
            debug!(symbol = %self.symbol, axis = %self.axis, price, max, "Price above grid, clamping risk to 1");
            return Ok(1.0);
        }

        let (lo, hi) = match self.bracket(price, |p| p.price) {
            Bracket::Exact(point) => return Ok(point.risk),
            Bracket::Between(lo, hi) => (lo, hi),
        };

        let span = hi.price - lo.price;
        if span <= 0.0 {
            return Err(Error::invalid_grid(
                self.symbol.as_str(),
                self.axis,
                format!("zero price span at {}", lo.price),
            ));
        }

        Ok(lo.risk + (price - lo.price) / span * (hi.risk - lo.risk))
    }

    /// Price for a normalized risk.
    ///
    /// Risks outside the grid's calibrated risk range clamp to the first or
    /// last grid price.
    pub fn price_at_risk(&self, risk: f64) -> Result<f64> {
        if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
            return Err(Error::OutOfRangeInput(format!(
                "risk {} for {} must be within [0, 1]",
                risk, self.symbol
            )));
        }

        let (first, last) = (self.first(), self.last());
        if risk <= first.risk {
            return Ok(first.price);
        }
        if risk >= last.risk {
            return Ok(last.price);
        }

        let (lo, hi) = match self.bracket(risk, |p| p.risk) {
            Bracket::Exact(point) => return Ok(point.price),
            Bracket::Between(lo, hi) => (lo, hi),
        };

        let span = hi.risk - lo.risk;
        if span <= 0.0 {
            return Err(Error::invalid_grid(
                self.symbol.as_str(),
                self.axis,
                format!("zero risk span at {}", lo.risk),
            ));
        }

        Ok(lo.price + (risk - lo.risk) / span * (hi.price - lo.price))
    }

    /// Find the grid points around `value` along one coordinate.
    ///
    /// Caller guarantees `value` lies within the grid's range on that
    /// coordinate.
    fn bracket(&self, value: f64, key: impl Fn(&GridPoint) -> f64) -> Bracket {
        let points = self.points();
        let idx = points
            .partition_point(|p| key(p) < value)
            .min(points.len() - 1);

        if key(&points[idx]) == value || idx == 0 {
            Bracket::Exact(points[idx])
        } else {
            Bracket::Between(points[idx - 1], points[idx])
        }
    }
}

enum Bracket {
    Exact(GridPoint),
    Between(GridPoint, GridPoint),
}
