//! riskband library
//!
//! Risk-band scoring for crypto assets: price/risk interpolation over
//! calibrated grids, dwell-time coefficients, zone scoring with target
//! suggestions, BTC-relative market phases and historical win rates.

pub mod bands;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod phase;
pub mod reference;
pub mod scoring;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Analysis, BandRung, EngineConfig, Quote, RiskEngine, RiskResult, ScoreReport};
pub use error::{Error, Result};
pub use grid::{RiskAxis, RiskGrid, Symbol};
pub use reference::{ReferenceSnapshot, ReferenceStore};
