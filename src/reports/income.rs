use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{SubAccount, TransactionCategory, TransactionRecord};
use crate::utils::round_currency;

/// Categories that make up the fee summary
pub const FEE_CATEGORIES: [TransactionCategory; 3] = [
    TransactionCategory::Section31Fee,
    TransactionCategory::CustodyFee,
    TransactionCategory::Commission,
];

/// Dividend totals per sub-account and fee totals per category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncomeSummary {
    pub dividends: BTreeMap<SubAccount, Decimal>,
    pub fees: BTreeMap<TransactionCategory, Decimal>,
}

impl IncomeSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut dividends: BTreeMap<SubAccount, Decimal> = SubAccount::all()
            .into_iter()
            .map(|account| (account, Decimal::ZERO))
            .collect();
        let mut fees: BTreeMap<TransactionCategory, Decimal> = FEE_CATEGORIES
            .into_iter()
            .map(|category| (category, Decimal::ZERO))
            .collect();

        for record in records {
            if record.category == TransactionCategory::Dividend {
                *dividends.entry(record.sub_account).or_default() += record.amount;
            } else if let Some(total) = fees.get_mut(&record.category) {
                *total += record.amount;
            }
        }

        for total in dividends.values_mut() {
            *total = round_currency(*total);
        }
        for total in fees.values_mut() {
            *total = round_currency(total.abs());
        }

        Self { dividends, fees }
    }

    pub fn dividends_for(&self, account: SubAccount) -> Decimal {
        self.dividends.get(&account).copied().unwrap_or_default()
    }

    pub fn fee_for(&self, category: TransactionCategory) -> Decimal {
        self.fees.get(&category).copied().unwrap_or_default()
    }

    pub fn dividend_total(&self) -> Decimal {
        self.dividends.values().copied().sum()
    }

    pub fn fee_total(&self) -> Decimal {
        self.fees.values().copied().sum()
    }
}

/// Dividend rows from every sub-account, oldest first
pub fn dividend_rows<'a, I>(records: I) -> Vec<&'a TransactionRecord>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut rows: Vec<&TransactionRecord> = records
        .into_iter()
        .filter(|r| r.category == TransactionCategory::Dividend)
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}

/// Fee rows (commission, Section 31, custody) from every sub-account, oldest first
pub fn fee_rows<'a, I>(records: I) -> Vec<&'a TransactionRecord>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut rows: Vec<&TransactionRecord> = records
        .into_iter()
        .filter(|r| r.category.is_fee())
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}
