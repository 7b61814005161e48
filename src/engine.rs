//! Risk Engine
//!
//! Front door for callers. Resolves a symbol to its reference profile once
//! per call and runs the pipeline over that snapshot:
//! interpolate -> classify band -> coefficient -> score -> target,
//! plus the BTC-relative phase read and win-rate for full analyses.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bands::coefficient::coefficient_for_band;
use crate::bands::{Band, DataQuality};
use crate::error::{Error, Result};
use crate::grid::{RiskAxis, Symbol};
use crate::phase::win_rate::{win_rate, WinRate};
use crate::phase::{classify_phase, PhaseResult, StrategicStance};
use crate::reference::{AssetProfile, ReferenceSnapshot, ReferenceStore};
use crate::scoring::target::{suggest_target, TargetSuggestion};
use crate::scoring::{score, ScoreResult, Signal};

/// Engine behaviour switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Search neighbouring bands for a better entry when scoring
    #[serde(default = "default_true")]
    pub suggest_targets: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggest_targets: true,
        }
    }
}

/// One interpolate + classify pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    pub symbol: Symbol,
    pub axis: RiskAxis,
    pub input_price: f64,
    pub risk: f64,
    pub band: Band,
    pub dwell_days: u32,
}

/// Fiat score with optional better-entry target
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub risk: RiskResult,
    pub score: ScoreResult,
    pub target: Option<TargetSuggestion>,
    pub quality: DataQuality,
    pub summary: String,
}

impl ScoreReport {
    pub fn symbol(&self) -> &Symbol {
        &self.risk.symbol
    }

    pub fn signal(&self) -> Signal {
        self.score.signal
    }
}

/// Full cross-asset analysis
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub report: ScoreReport,
    pub phase: PhaseResult,
    pub win_rate: WinRate,
    pub stance: StrategicStance,
    pub narrative: String,
}

/// Per-band view of an asset (dashboard ladder)
#[derive(Debug, Clone, Serialize)]
pub struct BandRung {
    pub band: Band,
    pub dwell_days: u32,
    /// Share of the asset's life spent in the band
    pub life_share: f64,
    pub coefficient: f64,
    pub base_score: u32,
    pub signal: Signal,
    /// Price at the band midpoint on the requested axis
    pub representative_price: f64,
    pub quality: DataQuality,
}

/// A symbol and its current price, for watchlist ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
}

impl std::str::FromStr for Quote {
    type Err = Error;

    /// Parse `SYMBOL=PRICE`
    fn from_str(s: &str) -> Result<Self> {
        let (symbol, price) = s
            .split_once('=')
            .ok_or_else(|| Error::OutOfRangeInput(format!("expected SYMBOL=PRICE, got '{}'", s)))?;
        let price: f64 = price
            .trim()
            .parse()
            .map_err(|_| Error::OutOfRangeInput(format!("invalid price in '{}'", s)))?;
        Ok(Quote {
            symbol: Symbol::new(symbol),
            price,
        })
    }
}

/// Stateless calculator over a shared reference store
#[derive(Debug, Clone)]
pub struct RiskEngine {
    store: Arc<ReferenceStore>,
    config: EngineConfig,
}

impl RiskEngine {
    pub fn new(store: Arc<ReferenceStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Engine over a freshly loaded snapshot with default settings
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        Self::new(
            Arc::new(ReferenceStore::from_snapshot(snapshot)),
            EngineConfig::default(),
        )
    }

    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.store
    }

    /// Risk value, band and dwell time for a price on one axis
    pub fn risk_at_price(&self, symbol: &Symbol, axis: RiskAxis, price: f64) -> Result<RiskResult> {
        let profile = self.store.profile(symbol)?;
        resolve(&profile, axis, price)
    }

    /// Price on one axis for a risk value
    pub fn price_at_risk(&self, symbol: &Symbol, axis: RiskAxis, risk: f64) -> Result<f64> {
        let profile = self.store.profile(symbol)?;
        profile.grid(axis)?.price_at_risk(risk)
    }

    /// Score the fiat price of an asset
    pub fn score(&self, symbol: &Symbol, price: f64) -> Result<ScoreReport> {
        let profile = self.store.profile(symbol)?;
        self.score_profile(&profile, price)
    }

    /// Fiat score plus BTC-relative phase, strategic stance and win rate
    pub fn analyze(&self, symbol: &Symbol, price: f64, btc_relative_price: f64) -> Result<Analysis> {
        let profile = self.store.profile(symbol)?;

        let report = self.score_profile(&profile, price)?;
        let phase = classify_phase(profile.grid(RiskAxis::BtcRelative)?, btc_relative_price)?;
        let win_rate = win_rate(&profile.bands, report.risk.risk)?;
        if win_rate.quality.is_degraded() {
            warn!(symbol = %profile.symbol, "Win rate degraded: {}", win_rate.explanation);
        }

        let stance = StrategicStance::from_reads(report.score.signal, phase.btc_risk);
        let narrative = format!(
            "{} {} in fiat, {} against BTC ({}). {}",
            profile.symbol,
            report.score.zone.description().to_lowercase(),
            phase.market_phase.description().to_lowercase(),
            phase.market_phase,
            stance.narrative()
        );

        debug!(
            symbol = %profile.symbol,
            signal = %report.score.signal,
            phase = %phase.market_phase,
            win_rate = win_rate.win_rate_pct,
            "Analysis complete"
        );

        Ok(Analysis {
            report,
            phase,
            win_rate,
            stance,
            narrative,
        })
    }

    /// All ten bands of an asset with their coefficients and prices
    pub fn band_ladder(&self, symbol: &Symbol, axis: RiskAxis) -> Result<Vec<BandRung>> {
        let profile = self.store.profile(symbol)?;
        let grid = profile.grid(axis)?;

        Band::all()
            .map(|band| {
                let coefficient = coefficient_for_band(&profile.bands, band);
                let midpoint = score(band.midpoint(), coefficient.value)?;
                Ok(BandRung {
                    band,
                    dwell_days: coefficient.dwell_days,
                    life_share: profile.bands.life_share(band),
                    coefficient: coefficient.value,
                    base_score: midpoint.base_score,
                    signal: midpoint.signal,
                    representative_price: grid.price_at_risk(band.midpoint())?,
                    quality: coefficient.quality,
                })
            })
            .collect()
    }

    /// Score a watchlist and order it by opportunity.
    ///
    /// Directional signals come first, highest total score first; neutral
    /// readings follow. Unknown symbols and bad prices are skipped with a
    /// warning; broken reference data aborts the ranking.
    pub fn rank(&self, quotes: &[Quote]) -> Result<Vec<ScoreReport>> {
        let mut reports = Vec::with_capacity(quotes.len());

        for quote in quotes {
            match self.score(&quote.symbol, quote.price) {
                Ok(report) => reports.push(report),
                Err(e) if e.is_caller_error() => {
                    warn!(symbol = %quote.symbol, "Skipping quote: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        reports.sort_by(|a, b| {
            b.signal()
                .is_directional()
                .cmp(&a.signal().is_directional())
                .then_with(|| {
                    b.score
                        .total_score
                        .partial_cmp(&a.score.total_score)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.symbol().cmp(b.symbol()))
        });

        Ok(reports)
    }

    fn score_profile(&self, profile: &AssetProfile, price: f64) -> Result<ScoreReport> {
        let risk = resolve(profile, RiskAxis::Fiat, price)?;
        let coefficient = coefficient_for_band(&profile.bands, risk.band);
        let scored = score(risk.risk, coefficient.value)?;

        let target = if self.config.suggest_targets {
            suggest_target(&profile.fiat_grid, &profile.bands, risk.band, &scored)?
        } else {
            None
        };

        if let Some(note) = coefficient.quality.note() {
            warn!(symbol = %profile.symbol, "Score degraded: {}", note);
        }

        let summary = summarize(&risk, &scored, target.as_ref(), &coefficient.quality);
        debug!(
            symbol = %profile.symbol,
            risk = risk.risk,
            band = %risk.band,
            total_score = scored.total_score,
            signal = %scored.signal,
            "Scored price"
        );

        Ok(ScoreReport {
            risk,
            score: scored,
            target,
            quality: coefficient.quality,
            summary,
        })
    }
}

/// Interpolate a price on one axis and classify it into a band
fn resolve(profile: &AssetProfile, axis: RiskAxis, price: f64) -> Result<RiskResult> {
    let grid = profile.grid(axis)?;
    let risk = grid.risk_at_price(price)?;
    let band = Band::for_risk(risk)?;

    Ok(RiskResult {
        symbol: profile.symbol.clone(),
        axis,
        input_price: price,
        risk,
        band,
        dwell_days: profile.bands.dwell_days_for(band),
    })
}

/// Human-readable one-liner for a score
fn summarize(
    risk: &RiskResult,
    scored: &ScoreResult,
    target: Option<&TargetSuggestion>,
    quality: &DataQuality,
) -> String {
    let mut summary = format!(
        "{} {} ({}) at risk {:.3} in band {}: {:.1} = {} x {:.2}",
        risk.symbol,
        scored.signal,
        scored.strength,
        risk.risk,
        risk.band,
        scored.total_score,
        scored.base_score,
        scored.coefficient
    );

    if let Some(target) = target {
        summary.push_str(&format!(
            "; better entry near {:.4} (band {}, {:+.1})",
            target.target_price, target.target_band, target.score_delta
        ));
    }

    if let Some(note) = quality.note() {
        summary.push_str(&format!(" [{}]", note));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::MarketPhase;
    use crate::reference::fixtures::{eth, snapshot, sol};
    use crate::scoring::Strength;

    fn engine() -> RiskEngine {
        RiskEngine::from_snapshot(snapshot(vec![eth(), sol()], "test"))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn test_risk_at_price() {
        let result = engine().risk_at_price(&sym("ETH"), RiskAxis::Fiat, 1800.0).unwrap();
        assert!((result.risk - 0.45).abs() < 1e-12);
        assert_eq!(result.band.index(), 4);
        assert_eq!(result.dwell_days, 320);
        assert_eq!(result.input_price, 1800.0);
    }

    #[test]
    fn test_price_at_risk_both_axes() {
        let engine = engine();
        let price = engine.price_at_risk(&sym("ETH"), RiskAxis::Fiat, 0.25).unwrap();
        assert!((price - 1000.0).abs() < 1e-9);

        let btc = engine.price_at_risk(&sym("ETH"), RiskAxis::BtcRelative, 0.5).unwrap();
        assert_eq!(btc, 0.04);

        let err = engine
            .price_at_risk(&sym("SOL"), RiskAxis::BtcRelative, 0.5)
            .unwrap_err();
        assert!(matches!(err, Error::MissingAxis { .. }));
    }

    #[test]
    fn test_unknown_symbol() {
        let err = engine().score(&sym("DOGE"), 0.1).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(_)));
    }

    #[test]
    fn test_score_neutral_midpoint() {
        // 2000 sits exactly at risk 0.5, the most common band
        let report = engine().score(&sym("ETH"), 2000.0).unwrap();
        assert_eq!(report.risk.risk, 0.5);
        assert_eq!(report.score.base_score, 50);
        assert_eq!(report.score.coefficient, 1.0);
        assert_eq!(report.score.total_score, 50.0);
        assert_eq!(report.score.signal, Signal::Neutral);
        assert_eq!(report.score.strength, Strength::Weak);
        assert!(report.target.is_none());
    }

    #[test]
    fn test_score_long_with_target() {
        // 1000 -> risk 0.25, band 2 (160 days = average, coefficient 1.0)
        let report = engine().score(&sym("ETH"), 1000.0).unwrap();
        assert_eq!(report.score.signal, Signal::Long);
        assert_eq!(report.risk.band.index(), 2);
        assert_eq!(report.score.coefficient, 1.0);

        // Band 1 has 48 days: 1 + 0.6 * (1 - 48/160) = 1.42
        let target = report.target.expect("band 1 is rarer");
        assert_eq!(target.target_band.index(), 1);
        assert!((target.target_coefficient - 1.42).abs() < 1e-9);
        assert!((target.target_price - 600.0).abs() < 1e-9);
        assert!(target.score_delta > 0.0);
        assert!(report.summary.contains("better entry"));
    }

    #[test]
    fn test_targets_can_be_disabled() {
        let store = Arc::new(ReferenceStore::from_snapshot(snapshot(vec![eth()], "test")));
        let engine = RiskEngine::new(
            store,
            EngineConfig {
                suggest_targets: false,
            },
        );
        let report = engine.score(&sym("ETH"), 1000.0).unwrap();
        assert!(report.target.is_none());
    }

    #[test]
    fn test_score_clamps_outside_grid() {
        let engine = engine();
        let report = engine.score(&sym("ETH"), 50.0).unwrap();
        assert_eq!(report.risk.risk, 0.0);
        assert_eq!(report.score.base_score, 100);

        let report = engine.score(&sym("ETH"), 99_999.0).unwrap();
        assert_eq!(report.risk.risk, 1.0);
        assert_eq!(report.risk.band.index(), 9);
        assert_eq!(report.score.signal, Signal::Short);
    }

    #[test]
    fn test_analyze() {
        // ETH at 500 -> risk 0.125 (band 1, LONG); BTC price 0.02 -> btc risk ~0.167
        let analysis = engine().analyze(&sym("ETH"), 500.0, 0.02).unwrap();

        assert_eq!(analysis.report.score.signal, Signal::Long);
        assert_eq!(analysis.phase.market_phase, MarketPhase::StrongBitcoinSeason);
        assert_eq!(analysis.stance, StrategicStance::DoubleDiscount);
        assert!(analysis.narrative.contains(analysis.stance.narrative()));

        // Band 1 has 48 days, middle bands average 320 -> 320/48*30 = 200 -> capped
        assert_eq!(analysis.win_rate.signal, Signal::Long);
        assert_eq!(analysis.win_rate.win_rate_pct, 95.0);
    }

    #[test]
    fn test_analyze_neutral_waits_for_altseason() {
        let analysis = engine().analyze(&sym("ETH"), 2000.0, 0.015).unwrap();
        assert_eq!(analysis.stance, StrategicStance::WaitForAltcoinSeason);
        assert_eq!(analysis.win_rate.win_rate_pct, 0.0);
        assert_eq!(analysis.win_rate.explanation, "no directional edge");
    }

    #[test]
    fn test_analyze_neutral_edges_have_no_win_rate() {
        let engine = engine();
        for risk in [0.35, 0.65] {
            let price = engine.price_at_risk(&sym("ETH"), RiskAxis::Fiat, risk).unwrap();
            let analysis = engine.analyze(&sym("ETH"), price, 0.02).unwrap();

            assert_eq!(analysis.win_rate.signal, analysis.report.score.signal);
            if analysis.report.score.signal == Signal::Neutral {
                assert_eq!(analysis.win_rate.win_rate_pct, 0.0);
                assert_eq!(analysis.win_rate.explanation, "no directional edge");
            }
        }
    }

    #[test]
    fn test_analyze_requires_btc_axis() {
        let err = engine().analyze(&sym("SOL"), 20.0, 0.0003).unwrap_err();
        assert!(err.is_data_error());
    }

    #[test]
    fn test_band_ladder() {
        let ladder = engine().band_ladder(&sym("ETH"), RiskAxis::Fiat).unwrap();
        assert_eq!(ladder.len(), 10);
        assert_eq!(ladder[0].dwell_days, 16);
        assert!((ladder[0].life_share - 16.0 / 1700.0).abs() < 1e-12);
        assert!((ladder[0].representative_price - 250.0).abs() < 1e-9);
        assert_eq!(ladder[0].signal, Signal::Long);
        assert_eq!(ladder[4].coefficient, 1.0);
        assert_eq!(ladder[9].signal, Signal::Short);
        for rung in &ladder {
            assert!((1.0..=1.6).contains(&rung.coefficient));
        }
    }

    #[test]
    fn test_rank_orders_by_opportunity() {
        let quotes: Vec<Quote> = ["ETH=2000", "SOL=2", "DOGE=0.1", "ETH=4900"]
            .iter()
            .map(|q| q.parse().unwrap())
            .collect();

        let ranked = engine().rank(&quotes).unwrap();
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].signal().is_directional());
        assert!(ranked[0].score.total_score >= ranked[1].score.total_score);
        assert_eq!(ranked[2].signal(), Signal::Neutral);
    }

    #[test]
    fn test_quote_parsing() {
        let quote: Quote = "eth=1234.5".parse().unwrap();
        assert_eq!(quote.symbol, sym("ETH"));
        assert_eq!(quote.price, 1234.5);
        assert!("ETH".parse::<Quote>().is_err());
        assert!("ETH=abc".parse::<Quote>().is_err());
    }
}
