// src/error.rs
//
// Error taxonomy for the what-if engine. Every public entry point returns
// one of these instead of panicking; all failures are local to the row or
// action they describe and never corrupt state for other rows or classes.

use std::error::Error;
use std::fmt;

use crate::session::RowId;

#[derive(Clone, Debug, PartialEq)]
pub enum CoreError {
    /// Cell text yields no recoverable numeric data.
    ParseFailure { cell: String },
    /// User-entered value is out of domain (negative, NaN, percent > 100,
    /// unrecognized letter, empty input on a non-excluded row).
    ValidationFailure { input: String, reason: String },
    /// An excluded-pattern row has no discoverable total; the caller must
    /// supply one (the `*_with_total` entry points).
    MissingDenominator { row: RowId },
    /// Delete/undo target not found, even after the fallback chain.
    LookupFailure { what: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::ParseFailure { cell } => {
                write!(f, "no score could be read from cell text: '{cell}'")
            }
            CoreError::ValidationFailure { input, reason } => {
                write!(f, "invalid value '{input}': {reason}")
            }
            CoreError::MissingDenominator { row } => {
                write!(f, "{row} has no point total; supply one as earned/total")
            }
            CoreError::LookupFailure { what } => {
                write!(f, "not found: {what}")
            }
        }
    }
}

impl Error for CoreError {}
