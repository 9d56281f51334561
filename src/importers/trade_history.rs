use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::{parse_date, parse_decimal, parse_optional_decimal, parse_time};
use crate::models::{Activity, Direction, TradeEvent};
use crate::tax::normalizer::{convert_consideration, CommissionPolicy};

/// One trade history row as it appears in the CSV
#[derive(Debug, Clone, Deserialize)]
pub struct RawTradeRow {
    pub instrument: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    pub activity: String,
    pub direction: String,
    pub quantity: String,
    pub price: String,
    #[serde(default)]
    pub commission: Option<String>,
    #[serde(default)]
    pub charges: Option<String>,
    #[serde(default)]
    pub conversion_rate: Option<String>,
}

/// How trade rows are turned into events
#[derive(Debug, Clone, Copy)]
pub struct TradeImportOptions {
    pub policy: CommissionPolicy,
    /// File lists the most recent row first
    pub newest_first: bool,
}

impl Default for TradeImportOptions {
    fn default() -> Self {
        Self {
            policy: CommissionPolicy::default(),
            newest_first: true,
        }
    }
}

impl RawTradeRow {
    /// Convert to a normalized event. A missing conversion rate means the
    /// row is already in the reporting currency.
    pub fn to_event(&self, policy: &CommissionPolicy, sequence: usize) -> Result<TradeEvent> {
        let date = parse_date(&self.date)?;
        let time = parse_time(self.time.as_deref())?;
        let activity = Activity::from_str(&self.activity)
            .map_err(|_| anyhow!("Invalid activity: {}", self.activity))?;
        let direction = Direction::from_str(&self.direction)
            .map_err(|_| anyhow!("Invalid direction: {}", self.direction))?;
        let quantity = parse_decimal(&self.quantity)?;
        let price = parse_decimal(&self.price)?;
        let raw_commission = parse_optional_decimal(self.commission.as_deref())?.unwrap_or_default();
        let charges = parse_optional_decimal(self.charges.as_deref())?.unwrap_or_default();
        let rate =
            parse_optional_decimal(self.conversion_rate.as_deref())?.unwrap_or(rust_decimal::Decimal::ONE);

        let instrument = self.instrument.trim();
        if instrument.is_empty() {
            return Err(anyhow!("Missing instrument"));
        }

        Ok(TradeEvent {
            instrument: instrument.to_string(),
            date,
            time,
            activity,
            direction,
            quantity,
            price,
            commission: policy.normalize_commission(date, raw_commission, rate),
            charges,
            consideration: convert_consideration(quantity, price, rate),
            sequence,
        })
    }
}

/// Load a trade history CSV file
pub fn load_trade_history<P: AsRef<Path>>(
    file_path: P,
    options: &TradeImportOptions,
) -> Result<Vec<TradeEvent>> {
    let path = file_path.as_ref();
    info!("Loading trade history: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open trade history {}", path.display()))?;
    parse_trade_history(file, options)
        .with_context(|| format!("Failed to load trade history {}", path.display()))
}

/// Parse trade history rows from any reader.
///
/// Rows that fail to parse are errors, reported with their line number.
pub fn parse_trade_history<R: Read>(reader: R, options: &TradeImportOptions) -> Result<Vec<TradeEvent>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(reader);

    let rows: Vec<RawTradeRow> = reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Failed to read trade row {}", idx + 2)))
        .collect::<Result<_>>()?;

    let count = rows.len();
    let events = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let sequence = if options.newest_first {
                count - 1 - idx
            } else {
                idx
            };
            row.to_event(&options.policy, sequence)
                .with_context(|| format!("Invalid trade row {}", idx + 2))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} trade events", events.len());
    Ok(events)
}
