//! Win-rate estimate for a directional signal
//!
//! Compares how long the asset usually sits in the two middle bands with
//! how long it has sat in its current band. The rarer the current band
//! relative to the middle, the higher the estimate:
//!
//! ```text
//! win_rate = min(95, middle_average / current_dwell * 30)
//! ```
//!
//! Direction comes from the scoring zone, so a neutral score never carries
//! a win rate.

use serde::Serialize;
use tracing::warn;

use crate::bands::{Band, BandTable, DataQuality, MIDDLE_BANDS};
use crate::error::{Error, Result};
use crate::scoring::{RiskZone, Signal};

/// Cap on any reported win rate (percent)
pub const MAX_WIN_RATE_PCT: f64 = 95.0;

/// Multiplier applied to the middle/current dwell ratio
pub const WIN_RATE_MULTIPLIER: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRate {
    pub signal: Signal,
    pub win_rate_pct: f64,
    pub explanation: String,
    pub quality: DataQuality,
}

impl WinRate {
    fn none(signal: Signal, explanation: String, quality: DataQuality) -> Self {
        Self {
            signal,
            win_rate_pct: 0.0,
            explanation,
            quality,
        }
    }
}

/// Estimate the win probability of acting at `risk`
pub fn win_rate(table: &BandTable, risk: f64) -> Result<WinRate> {
    if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
        return Err(Error::OutOfRangeInput(format!(
            "risk {} must be within [0, 1]",
            risk
        )));
    }

    let signal = RiskZone::for_risk(risk).signal();
    if signal == Signal::Neutral {
        return Ok(WinRate::none(
            Signal::Neutral,
            "no directional edge".to_string(),
            DataQuality::Complete,
        ));
    }

    let band = Band::for_risk(risk)?;
    let current_days = table.dwell_days_for(band);
    if current_days == 0 {
        warn!(band = %band, "No dwell history for current band, win rate unavailable");
        let note = format!("insufficient history: band {} has no recorded dwell days", band);
        return Ok(WinRate::none(
            signal,
            note.clone(),
            DataQuality::InsufficientHistory(note),
        ));
    }

    let target_days = MIDDLE_BANDS
        .iter()
        .map(|b| table.dwell_days_for(*b) as f64)
        .sum::<f64>()
        / MIDDLE_BANDS.len() as f64;

    let win_rate_pct = (target_days / current_days as f64 * WIN_RATE_MULTIPLIER)
        .clamp(0.0, MAX_WIN_RATE_PCT);

    let explanation = format!(
        "{} days in band {} vs {:.1} average days in the middle bands",
        current_days, band, target_days
    );

    Ok(WinRate {
        signal,
        win_rate_pct,
        explanation,
        quality: DataQuality::Complete,
    })
}
