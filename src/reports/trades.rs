use rust_decimal::Decimal;
use serde::Serialize;

use crate::tax::cost_basis::ClosedTradeResult;
use crate::utils::{round_currency, round_fraction};

/// Totals over a set of closed trades.
///
/// `initial_consideration` and `final_consideration` are unrounded sums of
/// the per-row values (each row is already rounded to pence), so summaries
/// from different sub-accounts can be merged and the percentage derived
/// again from the merged sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSummary {
    pub trade_count: usize,
    pub initial_consideration: Decimal,
    pub final_consideration: Decimal,
    pub fees: Decimal,
    pub net_profit: Decimal,
}

impl TradeSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ClosedTradeResult>,
    {
        results
            .into_iter()
            .fold(TradeSummary::default(), |mut acc, result| {
                acc.trade_count += 1;
                acc.initial_consideration += result.initial_consideration;
                acc.final_consideration += result.final_consideration;
                acc.fees += result.fees;
                acc.net_profit += result.net_profit;
                acc
            })
    }

    /// Capital originally paid for the shares sold
    pub fn invested(&self) -> Decimal {
        round_currency(self.initial_consideration)
    }

    /// Total sale proceeds
    pub fn proceeds(&self) -> Decimal {
        round_currency(self.final_consideration)
    }

    pub fn total_fees(&self) -> Decimal {
        round_currency(self.fees.abs())
    }

    pub fn total_net_profit(&self) -> Decimal {
        round_currency(self.net_profit)
    }

    /// `(Σfinal / Σinitial - 1) × 100`, or `None` without a cost basis
    pub fn net_profit_pct(&self) -> Option<Decimal> {
        if self.initial_consideration.is_zero() {
            return None;
        }
        Some((self.final_consideration / self.initial_consideration - Decimal::ONE) * Decimal::ONE_HUNDRED)
    }

    /// Combine two disjoint summaries by adding their raw sums
    pub fn merge(&self, other: &TradeSummary) -> TradeSummary {
        TradeSummary {
            trade_count: self.trade_count + other.trade_count,
            initial_consideration: self.initial_consideration + other.initial_consideration,
            final_consideration: self.final_consideration + other.final_consideration,
            fees: self.fees + other.fees,
            net_profit: self.net_profit + other.net_profit,
        }
    }
}

/// Flat view for presentation, rounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSummaryFigures {
    pub trades: usize,
    pub invested: Decimal,
    pub proceeds: Decimal,
    pub fees: Decimal,
    pub net_profit: Decimal,
    pub net_profit_pct: Option<Decimal>,
}

impl From<&TradeSummary> for TradeSummaryFigures {
    fn from(summary: &TradeSummary) -> Self {
        Self {
            trades: summary.trade_count,
            invested: summary.invested(),
            proceeds: summary.proceeds(),
            fees: summary.total_fees(),
            net_profit: summary.total_net_profit(),
            net_profit_pct: summary.net_profit_pct().map(round_fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    fn result(initial: Decimal, final_c: Decimal, fees: Decimal) -> ClosedTradeResult {
        ClosedTradeResult {
            instrument: "Amazon.com Inc".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
            time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            quantity: dec!(1),
            price: final_c,
            consideration: final_c,
            initial_consideration: initial,
            final_consideration: final_c,
            fees,
            gross_profit: final_c - initial,
            net_profit: final_c - initial - fees,
            net_return: None,
        }
    }

    #[test]
    fn test_summary_totals() {
        let rows = vec![
            result(dec!(1600), dec!(2250), dec!(25)),
            result(dec!(500), dec!(450), dec!(10)),
        ];
        let summary = TradeSummary::from_results(&rows);
        assert_eq!(summary.trade_count, 2);
        assert_eq!(summary.invested(), dec!(2100));
        assert_eq!(summary.proceeds(), dec!(2700));
        assert_eq!(summary.total_fees(), dec!(35));
        assert_eq!(summary.total_net_profit(), dec!(565));
    }

    #[test]
    fn test_empty_summary_has_no_percentage() {
        let summary = TradeSummary::from_results(&Vec::<ClosedTradeResult>::new());
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.net_profit_pct(), None);
        assert_eq!(TradeSummaryFigures::from(&summary).net_profit_pct, None);
    }

    #[test]
    fn test_merge_recombines_raw_sums() {
        let sd = TradeSummary::from_results(&[result(dec!(1000), dec!(1200), dec!(0))]);
        let isa = TradeSummary::from_results(&[result(dec!(500), dec!(450), dec!(0))]);

        let combined = sd.merge(&isa);
        assert_eq!(combined.initial_consideration, dec!(1500));
        assert_eq!(combined.final_consideration, dec!(1650));

        let pct = combined.net_profit_pct().unwrap();
        assert_eq!(pct.round_dp(2), dec!(10.00));

        // Not the mean of +20% and -10%
        let mean = (sd.net_profit_pct().unwrap() + isa.net_profit_pct().unwrap()) / dec!(2);
        assert_ne!(pct, mean);
    }

    #[test]
    fn test_fees_reported_as_absolute_value() {
        let summary = TradeSummary::from_results(&[result(dec!(100), dec!(100), dec!(-7.5))]);
        assert_eq!(summary.total_fees(), dec!(7.5));
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        let summary = TradeSummary::from_results(&[result(dec!(2000000), dec!(2000001), dec!(0))]);
        assert_eq!(summary.net_profit_pct(), Some(dec!(0.00005)));
        assert_eq!(TradeSummaryFigures::from(&summary).net_profit_pct, Some(dec!(0.0001)));
    }
}
