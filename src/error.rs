//! Error types for the risk engine

use thiserror::Error;

use crate::grid::RiskAxis;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the risk engine
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No {axis} grid for {symbol}")]
    MissingAxis { symbol: String, axis: RiskAxis },

    // Reference data errors
    #[error("Invalid {axis} grid for {symbol}: {reason}")]
    InvalidGrid {
        symbol: String,
        axis: RiskAxis,
        reason: String,
    },

    #[error("Invalid band table for {symbol}: {reason}")]
    InvalidBandTable { symbol: String, reason: String },

    #[error("Reference data error: {0}")]
    ReferenceData(String),

    // Caller errors
    #[error("Input out of range: {0}")]
    OutOfRangeInput(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error points at corrupt or incomplete reference data.
    ///
    /// These must be surfaced to whoever provisions the grids and band
    /// tables; the engine never coerces them.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidGrid { .. }
                | Error::InvalidBandTable { .. }
                | Error::MissingAxis { .. }
                | Error::ReferenceData(_)
        )
    }

    /// Check if this error was caused by the caller's request
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::UnknownSymbol(_) | Error::OutOfRangeInput(_))
    }

    pub(crate) fn invalid_grid(symbol: &str, axis: RiskAxis, reason: impl Into<String>) -> Self {
        Error::InvalidGrid {
            symbol: symbol.to_string(),
            axis,
            reason: reason.into(),
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
