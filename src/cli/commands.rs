//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, OutputFormat, OutputConfig};
use crate::engine::{Analysis, BandRung, Quote, RiskEngine, ScoreReport};
use crate::grid::{RiskAxis, Symbol};
use crate::reference::{loader, ReferenceStore};

/// Load reference data and build the engine
pub fn load_engine(config: &Config) -> Result<RiskEngine> {
    let snapshot = loader::load_file(&config.data.reference_path).with_context(|| {
        format!(
            "Failed to load reference data from {}",
            config.data.reference_path.display()
        )
    })?;

    let store = Arc::new(ReferenceStore::from_snapshot(snapshot));
    Ok(RiskEngine::new(store, config.engine.clone()))
}

/// Risk value for a price
pub fn risk(config: &Config, symbol: &str, price: f64, axis: RiskAxis) -> Result<()> {
    let engine = load_engine(config)?;
    let result = engine.risk_at_price(&Symbol::new(symbol), axis, price)?;

    emit(&config.output, &result, |out| {
        format!(
            "{} {} price {} -> risk {} (band {}, {} days)",
            result.symbol,
            result.axis,
            fmt_price(out, result.input_price),
            fmt_risk(out, result.risk),
            result.band,
            result.dwell_days
        )
    })
}

/// Price for a risk value
pub fn price(config: &Config, symbol: &str, risk: f64, axis: RiskAxis) -> Result<()> {
    let engine = load_engine(config)?;
    let symbol = Symbol::new(symbol);
    let price = engine.price_at_risk(&symbol, axis, risk)?;

    #[derive(Serialize)]
    struct PriceAtRisk<'a> {
        symbol: &'a Symbol,
        axis: RiskAxis,
        risk: f64,
        price: f64,
    }

    let result = PriceAtRisk {
        symbol: &symbol,
        axis,
        risk,
        price,
    };
    emit(&config.output, &result, |out| {
        format!(
            "{} {} risk {} -> price {}",
            symbol,
            axis,
            fmt_risk(out, risk),
            fmt_price(out, price)
        )
    })
}

/// Score a fiat price
pub fn score(config: &Config, symbol: &str, price: f64) -> Result<()> {
    let engine = load_engine(config)?;
    let report = engine.score(&Symbol::new(symbol), price)?;

    emit(&config.output, &report, |out| render_report(out, &report))
}

/// Full analysis with the BTC-relative axis
pub fn analyze(config: &Config, symbol: &str, price: f64, btc_price: f64) -> Result<()> {
    let engine = load_engine(config)?;
    let analysis = engine.analyze(&Symbol::new(symbol), price, btc_price)?;

    emit(&config.output, &analysis, |out| render_analysis(out, &analysis))
}

/// Per-band ladder for an asset
pub fn bands(config: &Config, symbol: &str, axis: RiskAxis) -> Result<()> {
    let engine = load_engine(config)?;
    let symbol = Symbol::new(symbol);
    let ladder = engine.band_ladder(&symbol, axis)?;

    emit(&config.output, &ladder, |out| render_ladder(out, &symbol, axis, &ladder))
}

/// Rank a list of SYMBOL=PRICE quotes
pub fn rank(config: &Config, raw_quotes: &[String]) -> Result<()> {
    let quotes = raw_quotes
        .iter()
        .map(|q| q.parse::<Quote>())
        .collect::<crate::Result<Vec<_>>>()?;

    let engine = load_engine(config)?;
    let ranked = engine.rank(&quotes)?;

    emit(&config.output, &ranked, |_| {
        let mut lines = vec![format!("=== RANKING ({} of {}) ===", ranked.len(), quotes.len())];
        for (i, report) in ranked.iter().enumerate() {
            lines.push(format!("{:>2}. {}", i + 1, report.summary));
        }
        lines.join("\n")
    })
}

/// Load and check the reference data
pub fn validate(config: &Config) -> Result<()> {
    let engine = load_engine(config)?;
    let store = engine.store();

    let mut missing = Vec::new();
    for symbol in &config.data.watchlist {
        if store.profile(&Symbol::new(symbol)).is_err() {
            warn!(symbol = %symbol, "Watchlist symbol missing from reference data");
            missing.push(symbol.to_ascii_uppercase());
        }
    }

    if let Some(info) = store.info() {
        println!("Reference data: {}", config.data.reference_path.display());
        println!("  version:  {}", info.version);
        if let Some(as_of) = info.as_of {
            println!("  as of:    {}", as_of);
        }
        println!("  loaded:   {}", info.loaded_at.to_rfc3339());
    }

    for symbol in store.symbols() {
        let profile = store.profile(&symbol)?;
        let (lo, hi) = profile.fiat_grid.price_range();
        println!(
            "  {:<8} fiat {} pts [{} .. {}]  btc axis: {}  history {}/{} days",
            symbol,
            profile.fiat_grid.points().len(),
            fmt_price(&config.output, lo),
            fmt_price(&config.output, hi),
            if profile.has_axis(RiskAxis::BtcRelative) { "yes" } else { "no" },
            profile.bands.classified_days(),
            profile.bands.life_age_days()
        );
    }

    if !missing.is_empty() {
        anyhow::bail!("Watchlist symbols missing from reference data: {}", missing.join(", "));
    }

    info!(assets = store.len(), "Reference data OK");
    Ok(())
}

/// Show effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.display());
    Ok(())
}

/// Print a result as JSON or as rendered text
fn emit<T: Serialize>(
    out: &OutputConfig,
    value: &T,
    render: impl FnOnce(&OutputConfig) -> String,
) -> Result<()> {
    match out.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", render(out)),
    }
    Ok(())
}

fn fmt_price(out: &OutputConfig, value: f64) -> String {
    format!("{:.*}", out.price_precision, value)
}

fn fmt_risk(out: &OutputConfig, value: f64) -> String {
    format!("{:.*}", out.risk_precision, value)
}

fn render_report(out: &OutputConfig, report: &ScoreReport) -> String {
    let mut lines = vec![
        format!("=== {} ===", report.risk.symbol),
        format!(
            "Price:       {} (risk {}, band {}, {} days in band)",
            fmt_price(out, report.risk.input_price),
            fmt_risk(out, report.risk.risk),
            report.risk.band,
            report.risk.dwell_days
        ),
        format!("Zone:        {}", report.score.zone.description()),
        format!(
            "Score:       {} x {:.2} = {:.1}",
            report.score.base_score, report.score.coefficient, report.score.total_score
        ),
        format!("Signal:      {} ({})", report.score.signal, report.score.strength),
    ];

    if let Some(target) = &report.target {
        lines.push(format!(
            "Target:      {} in band {} (coefficient {:.2}, score {:.1}, {:+.1})",
            fmt_price(out, target.target_price),
            target.target_band,
            target.target_coefficient,
            target.target_score,
            target.score_delta
        ));
    }

    if let Some(note) = report.quality.note() {
        lines.push(format!("Note:        {}", note));
    }

    lines.join("\n")
}

fn render_analysis(out: &OutputConfig, analysis: &Analysis) -> String {
    let mut text = render_report(out, &analysis.report);
    text.push_str(&format!(
        "\nBTC axis:    {} (risk {}, band {})\nPhase:       {}\nWin rate:    {:.1}% ({})\n\n{}",
        analysis.phase.btc_relative_price,
        fmt_risk(out, analysis.phase.btc_risk),
        analysis.phase.btc_band,
        analysis.phase.market_phase,
        analysis.win_rate.win_rate_pct,
        analysis.win_rate.explanation,
        analysis.narrative
    ));
    text
}

fn render_ladder(out: &OutputConfig, symbol: &Symbol, axis: RiskAxis, ladder: &[BandRung]) -> String {
    let mut lines = vec![
        format!("=== {} {} BANDS ===", symbol, axis),
        format!(
            "{:<9} {:>7} {:>7} {:>6} {:>5} {:>8} {:>14}",
            "band", "days", "life%", "coef", "base", "signal", "price"
        ),
    ];

    for rung in ladder {
        lines.push(format!(
            "{:<9} {:>7} {:>6.1}% {:>6.2} {:>5} {:>8} {:>14}{}",
            rung.band.to_string(),
            rung.dwell_days,
            rung.life_share * 100.0,
            rung.coefficient,
            rung.base_score,
            rung.signal.to_string(),
            fmt_price(out, rung.representative_price),
            if rung.quality.is_degraded() { " *" } else { "" }
        ));
    }

    if ladder.iter().any(|r| r.quality.is_degraded()) {
        lines.push("* no dwell history, neutral coefficient used".to_string());
    }

    lines.join("\n")
}
