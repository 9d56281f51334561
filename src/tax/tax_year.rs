use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::error::LedgerError;
use crate::reports::window::DateWindow;

/// First day of a tax year (month, day); 6 April in the UK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxYearStart {
    pub month: u32,
    pub day: u32,
}

impl Default for TaxYearStart {
    fn default() -> Self {
        Self { month: 4, day: 6 }
    }
}

/// A tax year, identified by the calendar year it starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxYear {
    pub start_year: i32,
    pub rule: TaxYearStart,
}

impl TaxYear {
    pub fn new(start_year: i32, rule: TaxYearStart) -> Self {
        Self { start_year, rule }
    }

    /// The tax year a date falls in
    pub fn containing(date: NaiveDate, rule: TaxYearStart) -> Self {
        let starts_this_year = (date.month(), date.day()) >= (rule.month, rule.day);
        let start_year = if starts_this_year {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start_year, rule }
    }

    /// The last complete tax year before `today`
    pub fn previous(today: NaiveDate, rule: TaxYearStart) -> Self {
        let current = Self::containing(today, rule);
        Self::new(current.start_year - 1, rule)
    }

    pub fn first_day(&self) -> Result<NaiveDate, LedgerError> {
        NaiveDate::from_ymd_opt(self.start_year, self.rule.month, self.rule.day).ok_or_else(|| {
            LedgerError::ConfigError(format!(
                "invalid tax year start {}-{}",
                self.rule.month, self.rule.day
            ))
        })
    }

    pub fn last_day(&self) -> Result<NaiveDate, LedgerError> {
        let next = Self::new(self.start_year + 1, self.rule).first_day()?;
        next.pred_opt()
            .ok_or_else(|| LedgerError::ConfigError("tax year end out of range".to_string()))
    }

    /// Inclusive window covering the whole tax year
    pub fn window(&self) -> Result<DateWindow, LedgerError> {
        DateWindow::new(self.first_day()?, self.last_day()?)
    }

    /// Parse "2020" or "2020/21"
    pub fn parse(input: &str, rule: TaxYearStart) -> Result<Self, LedgerError> {
        let trimmed = input.trim();
        let (first, second) = match trimmed.split_once('/') {
            Some((a, b)) => (a, Some(b)),
            None => (trimmed, None),
        };

        let start_year: i32 = first
            .parse()
            .map_err(|_| LedgerError::ParseError(format!("invalid tax year: {}", input)))?;

        if let Some(suffix) = second {
            let expected = format!("{:02}", (start_year + 1).rem_euclid(100));
            if suffix != expected && suffix != (start_year + 1).to_string() {
                return Err(LedgerError::ParseError(format!(
                    "tax year {} does not end in {}",
                    input, expected
                )));
            }
        }

        Ok(Self::new(start_year, rule))
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}
