use chrono::NaiveDate;
use serde::Serialize;

use crate::error::LedgerError;
use crate::models::TransactionRecord;
use crate::tax::cost_basis::ClosedTradeResult;

/// Rows that can be selected by date
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for ClosedTradeResult {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for TransactionRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl<T: Dated> Dated for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }
}

/// Reporting window, inclusive of both `start` and `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering every row, or `None` when there are no rows
    pub fn spanning<T: Dated>(rows: &[T]) -> Option<Self> {
        let start = rows.iter().map(Dated::date).min()?;
        let end = rows.iter().map(Dated::date).max()?;
        Some(Self { start, end })
    }

    /// Smallest window containing both
    pub fn union(&self, other: &DateWindow) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Select the rows dated inside the window, preserving order
    pub fn filter<'a, T: Dated>(&self, rows: &'a [T]) -> Vec<&'a T> {
        rows.iter().filter(|row| self.contains(row.date())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubAccount, TransactionCategory};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate) -> TransactionRecord {
        TransactionRecord {
            date: d,
            sub_account: SubAccount::Isa,
            category: TransactionCategory::Dividend,
            amount: dec!(1.50),
            instrument: None,
            dividend: None,
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let window = DateWindow::new(date(2020, 4, 6), date(2021, 4, 5)).unwrap();
        let rows = vec![
            record(date(2020, 4, 5)),
            record(date(2020, 4, 6)),
            record(date(2020, 12, 1)),
            record(date(2021, 4, 5)),
            record(date(2021, 4, 6)),
        ];
        let selected = window.filter(&rows);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].date, date(2020, 4, 6));
        assert_eq!(selected[2].date, date(2021, 4, 5));
    }

    #[test]
    fn test_single_day_window() {
        let window = DateWindow::new(date(2021, 1, 1), date(2021, 1, 1)).unwrap();
        assert!(window.contains(date(2021, 1, 1)));
        assert!(!window.contains(date(2021, 1, 2)));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let err = DateWindow::new(date(2021, 1, 2), date(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidWindow { .. }));
    }

    #[test]
    fn test_spanning_covers_all_rows() {
        let rows = vec![record(date(2021, 3, 1)), record(date(2019, 5, 1))];
        let window = DateWindow::spanning(&rows).unwrap();
        assert_eq!(window.start, date(2019, 5, 1));
        assert_eq!(window.end, date(2021, 3, 1));
        assert_eq!(window.filter(&rows).len(), 2);
        assert!(DateWindow::spanning::<TransactionRecord>(&[]).is_none());
    }
}
