// Import module - Typed trade and transaction history CSV loaders

pub mod trade_history;
pub mod transaction_history;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

pub use trade_history::{load_trade_history, parse_trade_history, RawTradeRow, TradeImportOptions};
pub use transaction_history::{
    load_transaction_history, parse_transaction_history, RawTransactionRow,
};

/// Parse `YYYY-MM-DD` or day-first `DD/MM/YYYY`
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map_err(|_| anyhow!("Invalid date: {}", value))
}

/// Parse `HH:MM:SS` or `HH:MM`; a missing time is midnight
pub fn parse_time(value: Option<&str>) -> Result<NaiveTime> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(NaiveTime::MIN),
        Some(v) => NaiveTime::parse_from_str(v, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(v, "%H:%M"))
            .map_err(|_| anyhow!("Invalid time: {}", v)),
    }
}

/// Parse a decimal, accepting thousands separators ("1,234.50")
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    let cleaned = value.trim().replace(',', "");
    Decimal::from_str(&cleaned).map_err(|_| anyhow!("Invalid number: {}", value))
}

/// Parse an optional decimal; empty means `None`
pub fn parse_optional_decimal(value: Option<&str>) -> Result<Option<Decimal>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_decimal(v).map(Some),
    }
}
