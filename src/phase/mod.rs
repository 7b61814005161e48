//! Cross-asset market phase
//!
//! Runs the asset's BTC-denominated price through its BTC-relative risk
//! grid and reads the result as a position in the Bitcoin-season /
//! altcoin-season cycle. Combined with the fiat signal this yields one of
//! four strategic stances.

pub mod win_rate;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bands::Band;
use crate::error::{Error, Result};
use crate::grid::{RiskAxis, RiskGrid};
use crate::scoring::Signal;

/// BTC-relative risk below which the asset is considered weak against BTC
pub const BTC_STRENGTH_PIVOT: f64 = 0.50;

/// Market phase read from BTC-relative risk, ordered from Bitcoin dominance
/// to altcoin euphoria
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketPhase {
    /// btc risk < 0.25
    StrongBitcoinSeason,
    /// 0.25 - 0.35
    BitcoinSeason,
    /// 0.35 - 0.50
    BitcoinLeaning,
    /// 0.50 - 0.65
    AltcoinLeaning,
    /// 0.65 - 0.75
    AltcoinSeason,
    /// 0.75 - 0.85
    StrongAltcoinSeason,
    /// >= 0.85
    PeakAltcoinSeason,
}

impl MarketPhase {
    pub fn from_btc_risk(btc_risk: f64) -> Self {
        if btc_risk < 0.25 {
            MarketPhase::StrongBitcoinSeason
        } else if btc_risk < 0.35 {
            MarketPhase::BitcoinSeason
        } else if btc_risk < 0.50 {
            MarketPhase::BitcoinLeaning
        } else if btc_risk < 0.65 {
            MarketPhase::AltcoinLeaning
        } else if btc_risk < 0.75 {
            MarketPhase::AltcoinSeason
        } else if btc_risk < 0.85 {
            MarketPhase::StrongAltcoinSeason
        } else {
            MarketPhase::PeakAltcoinSeason
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MarketPhase::StrongBitcoinSeason => "Bitcoin dominating, asset deeply weak against BTC",
            MarketPhase::BitcoinSeason => "Bitcoin season, asset lagging BTC",
            MarketPhase::BitcoinLeaning => "Bitcoin slightly ahead",
            MarketPhase::AltcoinLeaning => "Asset slightly ahead of BTC",
            MarketPhase::AltcoinSeason => "Altcoin season, asset outperforming BTC",
            MarketPhase::StrongAltcoinSeason => "Strong altcoin season",
            MarketPhase::PeakAltcoinSeason => "Altcoin season peak, rotation back to BTC likely",
        }
    }
}

impl std::fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MarketPhase::StrongBitcoinSeason => "STRONG_BITCOIN_SEASON",
            MarketPhase::BitcoinSeason => "BITCOIN_SEASON",
            MarketPhase::BitcoinLeaning => "BITCOIN_LEANING",
            MarketPhase::AltcoinLeaning => "ALTCOIN_LEANING",
            MarketPhase::AltcoinSeason => "ALTCOIN_SEASON",
            MarketPhase::StrongAltcoinSeason => "STRONG_ALTCOIN_SEASON",
            MarketPhase::PeakAltcoinSeason => "PEAK_ALTCOIN_SEASON",
        };
        f.write_str(label)
    }
}

/// Result of running the BTC-relative axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseResult {
    pub btc_relative_price: f64,
    pub btc_risk: f64,
    pub btc_band: Band,
    pub market_phase: MarketPhase,
    pub narrative: String,
}

/// Classify the market phase from the asset's BTC-denominated price
pub fn classify_phase(btc_grid: &RiskGrid, btc_relative_price: f64) -> Result<PhaseResult> {
    if btc_grid.axis() != RiskAxis::BtcRelative {
        return Err(Error::invalid_grid(
            btc_grid.symbol().as_str(),
            btc_grid.axis(),
            "phase classification needs the btc_relative grid",
        ));
    }

    let btc_risk = btc_grid.risk_at_price(btc_relative_price)?;
    let btc_band = Band::for_risk(btc_risk)?;
    let market_phase = MarketPhase::from_btc_risk(btc_risk);

    debug!(
        symbol = %btc_grid.symbol(),
        btc_relative_price,
        btc_risk,
        phase = %market_phase,
        "Classified market phase"
    );

    Ok(PhaseResult {
        btc_relative_price,
        btc_risk,
        btc_band,
        market_phase,
        narrative: market_phase.description().to_string(),
    })
}

/// Combined read of the fiat signal and BTC-relative strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategicStance {
    /// Oversold in fiat and weak against BTC
    DoubleDiscount,
    /// Oversold in fiat but holding up against BTC
    RelativeStrengthDip,
    /// Not oversold in fiat while BTC outperforms
    WaitForAltcoinSeason,
    /// Not oversold in fiat and outperforming BTC
    AltcoinSeasonRally,
}

impl StrategicStance {
    /// Long fiat signals count as oversold; neutral and short as not.
    pub fn from_reads(fiat_signal: Signal, btc_risk: f64) -> Self {
        let oversold = fiat_signal == Signal::Long;
        let weak_vs_btc = btc_risk < BTC_STRENGTH_PIVOT;

        match (oversold, weak_vs_btc) {
            (true, true) => StrategicStance::DoubleDiscount,
            (true, false) => StrategicStance::RelativeStrengthDip,
            (false, true) => StrategicStance::WaitForAltcoinSeason,
            (false, false) => StrategicStance::AltcoinSeasonRally,
        }
    }

    pub fn narrative(&self) -> &'static str {
        match self {
            StrategicStance::DoubleDiscount => {
                "Oversold in fiat and against Bitcoin. Accumulate ahead of the altcoin rotation."
            }
            StrategicStance::RelativeStrengthDip => {
                "Oversold in fiat but outperforming Bitcoin. Relative strength dip, accumulate selectively."
            }
            StrategicStance::WaitForAltcoinSeason => {
                "Bitcoin strongly outperforming — wait for altcoin season."
            }
            StrategicStance::AltcoinSeasonRally => {
                "Altcoin season underway. Scale out into strength."
            }
        }
    }
}
