//! Error handling for capgains
//!
//! Defines the ledger error kinds raised by matching, windowing and loading,
//! and establishes a unified Result type using anyhow for context chaining.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types for ledger operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error(
        "insufficient lots for {instrument} sale on {date}: selling {requested} but only {available} held"
    )]
    InsufficientLots {
        instrument: String,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
    },

    #[error("malformed event ordering for {instrument}: {detail}")]
    MalformedEventOrdering { instrument: String, detail: String },

    #[error("malformed corporate action for {instrument} on {date}: {detail}")]
    MalformedCorporateAction {
        instrument: String,
        date: NaiveDate,
        detail: String,
    },

    #[error("invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
