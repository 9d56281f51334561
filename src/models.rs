use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sub-account a record belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubAccount {
    ShareDealing, // Taxable dealing account
    Isa,          // Stocks & Shares ISA
}

impl SubAccount {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubAccount::ShareDealing => "SHARE_DEALING",
            SubAccount::Isa => "ISA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubAccount::ShareDealing => "Share Dealing",
            SubAccount::Isa => "ISA",
        }
    }

    pub fn all() -> [SubAccount; 2] {
        [SubAccount::ShareDealing, SubAccount::Isa]
    }
}

impl FromStr for SubAccount {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(&[' ', '-'][..], "_").as_str() {
            "SHARE_DEALING" | "SD" => Ok(SubAccount::ShareDealing),
            "ISA" => Ok(SubAccount::Isa),
            _ => Err(()),
        }
    }
}

/// Kind of trade history row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activity {
    OrdinaryTrade,
    CorporateAction, // Split markers
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::OrdinaryTrade => "ORDINARY_TRADE",
            Activity::CorporateAction => "CORPORATE_ACTION",
        }
    }
}

impl FromStr for Activity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(' ', "_").as_str() {
            "ORDINARY_TRADE" | "TRADE" => Ok(Activity::OrdinaryTrade),
            "CORPORATE_ACTION" => Ok(Activity::CorporateAction),
            _ => Err(()),
        }
    }
}

/// Trade direction (buy or sell)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Ok(Direction::Buy),
            "SELL" | "S" => Ok(Direction::Sell),
            _ => Err(()),
        }
    }
}

/// One row of trade history, already normalized to the reporting currency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeEvent {
    pub instrument: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub activity: Activity,
    pub direction: Direction,
    pub quantity: Decimal, // Signed, negative for sells
    pub price: Decimal,
    pub commission: Decimal, // Reporting currency, post-normalization
    pub charges: Decimal,
    pub consideration: Decimal, // quantity × price × conversion rate
    pub sequence: usize,        // Chronological feed position, tie break
}

impl TradeEvent {
    /// Ordering key within an instrument stream
    pub fn chrono_key(&self) -> (NaiveDate, NaiveTime, usize) {
        (self.date, self.time, self.sequence)
    }

    /// Fees attached to this event: |commission + charges|
    pub fn fee(&self) -> Decimal {
        (self.commission + self.charges).abs()
    }
}

/// Cash transaction category, resolved by the ingestion layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionCategory {
    Dividend,
    Commission,
    #[serde(rename = "SECTION_31_FEE")]
    Section31Fee, // US SEC Section 31 regulatory fee
    CustodyFee,
    CashIn,
    Bonus,
    Other,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Dividend => "DIVIDEND",
            TransactionCategory::Commission => "COMMISSION",
            TransactionCategory::Section31Fee => "SECTION_31_FEE",
            TransactionCategory::CustodyFee => "CUSTODY_FEE",
            TransactionCategory::CashIn => "CASH_IN",
            TransactionCategory::Bonus => "BONUS",
            TransactionCategory::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionCategory::Dividend => "Dividend",
            TransactionCategory::Commission => "Share Dealing Commissions",
            TransactionCategory::Section31Fee => "Section 31 Fee",
            TransactionCategory::CustodyFee => "Custody Fee",
            TransactionCategory::CashIn => "Cash In",
            TransactionCategory::Bonus => "Bonus",
            TransactionCategory::Other => "Other",
        }
    }

    /// Categories reported in the fee summary
    pub fn is_fee(&self) -> bool {
        matches!(
            self,
            TransactionCategory::Commission
                | TransactionCategory::Section31Fee
                | TransactionCategory::CustodyFee
        )
    }
}

impl FromStr for TransactionCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(' ', "_").as_str() {
            "DIVIDEND" => Ok(TransactionCategory::Dividend),
            "COMMISSION" | "SHARE_DEALING_COMMISSIONS" => Ok(TransactionCategory::Commission),
            "SECTION_31_FEE" => Ok(TransactionCategory::Section31Fee),
            "CUSTODY_FEE" => Ok(TransactionCategory::CustodyFee),
            "CASH_IN" => Ok(TransactionCategory::CashIn),
            "BONUS" => Ok(TransactionCategory::Bonus),
            "OTHER" => Ok(TransactionCategory::Other),
            _ => Err(()),
        }
    }
}

/// Dividend breakdown: shares held, amount per share and FX rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DividendDetail {
    pub quantity: Decimal,
    pub price: Decimal,
    pub conversion_rate: Option<Decimal>,
}

/// Cash transaction (dividend, fee, deposit...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub sub_account: SubAccount,
    pub category: TransactionCategory,
    pub amount: Decimal, // Signed, reporting currency
    pub instrument: Option<String>,
    pub dividend: Option<DividendDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_category_from_str_accepts_labels() {
        assert_eq!(
            TransactionCategory::from_str("Section 31 Fee"),
            Ok(TransactionCategory::Section31Fee)
        );
        assert_eq!(
            TransactionCategory::from_str("share dealing commissions"),
            Ok(TransactionCategory::Commission)
        );
        assert_eq!(
            TransactionCategory::from_str("CUSTODY_FEE"),
            Ok(TransactionCategory::CustodyFee)
        );
        assert!(TransactionCategory::from_str("Custody Fee Q1 2021 (ISA)").is_err());
    }

    #[test]
    fn test_category_serde_names_match_as_str() {
        for category in [
            TransactionCategory::Dividend,
            TransactionCategory::Section31Fee,
            TransactionCategory::CashIn,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_activity_and_direction_parsing() {
        assert_eq!(
            Activity::from_str("Corporate Action"),
            Ok(Activity::CorporateAction)
        );
        assert_eq!(Activity::from_str("trade"), Ok(Activity::OrdinaryTrade));
        assert_eq!(Direction::from_str(" sell "), Ok(Direction::Sell));
        assert!(Direction::from_str("hold").is_err());
    }

    #[test]
    fn test_sub_account_parsing() {
        assert_eq!(SubAccount::from_str("Share Dealing"), Ok(SubAccount::ShareDealing));
        assert_eq!(SubAccount::from_str("sd"), Ok(SubAccount::ShareDealing));
        assert_eq!(SubAccount::from_str("isa"), Ok(SubAccount::Isa));
    }

    #[test]
    fn test_trade_event_fee_is_absolute() {
        let event = TradeEvent {
            instrument: "Apple Inc".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
            time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            activity: Activity::OrdinaryTrade,
            direction: Direction::Buy,
            quantity: dec!(5),
            price: dec!(130),
            commission: dec!(-10),
            charges: dec!(-0.5),
            consideration: dec!(475),
            sequence: 0,
        };
        assert_eq!(event.fee(), dec!(10.5));
    }
}
