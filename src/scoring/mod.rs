//! Signal scoring
//!
//! A risk value falls into one of seven zones that are symmetric around
//! the neutral midpoint. Each zone carries a base score and a direction;
//! the band coefficient then amplifies the base score into the total
//! score that decides the signal strength.
//!
//! | risk range   | base | signal  |
//! |--------------|------|---------|
//! | [0.00, 0.15) | 100  | long    |
//! | [0.15, 0.25) | 80   | long    |
//! | [0.25, 0.35) | 60   | long    |
//! | [0.35, 0.65] | 50   | neutral |
//! | (0.65, 0.75] | 60   | short   |
//! | (0.75, 0.85] | 80   | short   |
//! | (0.85, 1.00] | 100  | short   |

pub mod target;

use serde::{Deserialize, Serialize};

use crate::bands::coefficient::{MAX_COEFFICIENT, MIN_COEFFICIENT};
use crate::error::{Error, Result};

/// Directional trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl Signal {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Neutral)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Strength tier of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
    Strongest,
}

impl Strength {
    /// Tier for a total score (boundaries inclusive)
    pub fn from_total_score(total_score: f64) -> Self {
        if total_score >= 150.0 {
            Strength::Strongest
        } else if total_score >= 120.0 {
            Strength::Strong
        } else if total_score >= 90.0 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Weak => write!(f, "WEAK"),
            Strength::Moderate => write!(f, "MODERATE"),
            Strength::Strong => write!(f, "STRONG"),
            Strength::Strongest => write!(f, "STRONGEST"),
        }
    }
}

/// Risk zone used for the base score lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskZone {
    ExtremeLow,
    Low,
    ModeratelyLow,
    Neutral,
    ModeratelyHigh,
    High,
    ExtremeHigh,
}

impl RiskZone {
    pub fn for_risk(risk: f64) -> Self {
        if risk < 0.15 {
            RiskZone::ExtremeLow
        } else if risk < 0.25 {
            RiskZone::Low
        } else if risk < 0.35 {
            RiskZone::ModeratelyLow
        } else if risk <= 0.65 {
            RiskZone::Neutral
        } else if risk <= 0.75 {
            RiskZone::ModeratelyHigh
        } else if risk <= 0.85 {
            RiskZone::High
        } else {
            RiskZone::ExtremeHigh
        }
    }

    pub fn base_score(&self) -> u32 {
        match self {
            RiskZone::ExtremeLow | RiskZone::ExtremeHigh => 100,
            RiskZone::Low | RiskZone::High => 80,
            RiskZone::ModeratelyLow | RiskZone::ModeratelyHigh => 60,
            RiskZone::Neutral => 50,
        }
    }

    pub fn signal(&self) -> Signal {
        match self {
            RiskZone::ExtremeLow | RiskZone::Low | RiskZone::ModeratelyLow => Signal::Long,
            RiskZone::Neutral => Signal::Neutral,
            RiskZone::ModeratelyHigh | RiskZone::High | RiskZone::ExtremeHigh => Signal::Short,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskZone::ExtremeLow => "Extremely oversold",
            RiskZone::Low => "Oversold",
            RiskZone::ModeratelyLow => "Leaning oversold",
            RiskZone::Neutral => "Fair value range",
            RiskZone::ModeratelyHigh => "Leaning overbought",
            RiskZone::High => "Overbought",
            RiskZone::ExtremeHigh => "Extremely overbought",
        }
    }
}

/// Score and signal derived from a risk value and band coefficient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub zone: RiskZone,
    pub base_score: u32,
    pub coefficient: f64,
    pub total_score: f64,
    pub signal: Signal,
    pub strength: Strength,
}

/// Score a risk value with its band coefficient.
///
/// Neutral signals are always [`Strength::Weak`], whatever their score.
pub fn score(risk: f64, coefficient: f64) -> Result<ScoreResult> {
    if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
        return Err(Error::OutOfRangeInput(format!(
            "risk {} must be within [0, 1]",
            risk
        )));
    }
    if !coefficient.is_finite() || !(MIN_COEFFICIENT..=MAX_COEFFICIENT).contains(&coefficient) {
        return Err(Error::OutOfRangeInput(format!(
            "coefficient {} must be within [{:.2}, {:.2}]",
            coefficient, MIN_COEFFICIENT, MAX_COEFFICIENT
        )));
    }

    let zone = RiskZone::for_risk(risk);
    let base_score = zone.base_score();
    let total_score = base_score as f64 * coefficient;
    let signal = zone.signal();

    let strength = if signal.is_directional() {
        Strength::from_total_score(total_score)
    } else {
        Strength::Weak
    };

    Ok(ScoreResult {
        zone,
        base_score,
        coefficient,
        total_score,
        signal,
        strength,
    })
}
