use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::{parse_date, parse_decimal, parse_optional_decimal};
use crate::error::LedgerError;
use crate::models::{DividendDetail, SubAccount, TransactionCategory, TransactionRecord};

/// One cash transaction row as it appears in the CSV
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionRow {
    pub date: String,
    pub category: String,
    pub amount: String,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub conversion_rate: Option<String>,
}

impl RawTransactionRow {
    pub fn to_record(&self, sub_account: SubAccount) -> Result<TransactionRecord> {
        let date = parse_date(&self.date)?;
        let category = TransactionCategory::from_str(&self.category).map_err(|_| {
            LedgerError::ParseError(format!("unknown transaction category: {}", self.category))
        })?;
        let amount = parse_decimal(&self.amount)?;

        let instrument = self
            .instrument
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let dividend = if category == TransactionCategory::Dividend {
            let quantity = parse_optional_decimal(self.quantity.as_deref())?;
            let price = parse_optional_decimal(self.price.as_deref())?;
            let conversion_rate = parse_optional_decimal(self.conversion_rate.as_deref())?;
            match (quantity, price) {
                (Some(quantity), Some(price)) => Some(DividendDetail {
                    quantity,
                    price,
                    conversion_rate,
                }),
                _ => None,
            }
        } else {
            None
        };

        Ok(TransactionRecord {
            date,
            sub_account,
            category,
            amount,
            instrument,
            dividend,
        })
    }
}

/// Load a transaction history CSV file for one sub-account
pub fn load_transaction_history<P: AsRef<Path>>(
    file_path: P,
    sub_account: SubAccount,
) -> Result<Vec<TransactionRecord>> {
    let path = file_path.as_ref();
    info!("Loading {} transactions: {:?}", sub_account.label(), path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open transaction history {}", path.display()))?;
    parse_transaction_history(file, sub_account)
        .with_context(|| format!("Failed to load transaction history {}", path.display()))
}

pub fn parse_transaction_history<R: Read>(
    reader: R,
    sub_account: SubAccount,
) -> Result<Vec<TransactionRecord>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<RawTransactionRow>().enumerate() {
        let line = idx + 2;
        let row = row.with_context(|| format!("Failed to read transaction row {}", line))?;
        let record = row
            .to_record(sub_account)
            .with_context(|| format!("Invalid transaction row {}", line))?;
        records.push(record);
    }

    debug!("Parsed {} transactions", records.len());
    Ok(records)
}
