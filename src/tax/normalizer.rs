//! Commission and consideration conversion into the reporting currency.
//!
//! Before the cutover the broker quoted commission in the instrument's
//! currency, so it has to be multiplied by the row's conversion rate. From
//! the cutover on, commission is already in the reporting currency.
//! Consideration is always converted.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Date commission switched from USD to GBP
pub const DEFAULT_COMMISSION_CUTOVER: NaiveDate = match NaiveDate::from_ymd_opt(2020, 4, 5) {
    Some(date) => date,
    None => panic!("invalid commission cutover date"),
};

/// Time-dependent commission conversion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionPolicy {
    pub cutover: NaiveDate,
}

impl CommissionPolicy {
    pub fn new(cutover: NaiveDate) -> Self {
        Self { cutover }
    }

    /// Commission in the reporting currency.
    ///
    /// Events strictly before the cutover are converted; events on or after
    /// it are returned unchanged.
    pub fn normalize_commission(
        &self,
        date: NaiveDate,
        raw_commission: Decimal,
        conversion_rate: Decimal,
    ) -> Decimal {
        if date < self.cutover {
            raw_commission * conversion_rate
        } else {
            raw_commission
        }
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            cutover: DEFAULT_COMMISSION_CUTOVER,
        }
    }
}

/// Consideration (quantity × price) in the reporting currency. No cutover.
pub fn convert_consideration(quantity: Decimal, price: Decimal, conversion_rate: Decimal) -> Decimal {
    quantity * price * conversion_rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_cutover_is_5_april_2020() {
        assert_eq!(CommissionPolicy::default().cutover, date(2020, 4, 5));
    }

    #[test]
    fn test_commission_before_cutover_is_converted() {
        let policy = CommissionPolicy::default();
        let gbp = policy.normalize_commission(date(2020, 4, 4), dec!(15), dec!(0.8));
        assert_eq!(gbp, dec!(12.0));
    }

    #[test]
    fn test_commission_on_cutover_is_unchanged() {
        let policy = CommissionPolicy::default();
        assert_eq!(
            policy.normalize_commission(date(2020, 4, 5), dec!(10), dec!(0.8)),
            dec!(10)
        );
        assert_eq!(
            policy.normalize_commission(date(2021, 1, 1), dec!(10), dec!(0.8)),
            dec!(10)
        );
    }

    #[test]
    fn test_custom_cutover() {
        let policy = CommissionPolicy::new(date(2019, 1, 1));
        assert_eq!(
            policy.normalize_commission(date(2019, 6, 1), dec!(15), dec!(0.75)),
            dec!(15)
        );
    }

    #[test]
    fn test_consideration_always_converted() {
        assert_eq!(convert_consideration(dec!(10), dec!(100), dec!(0.75)), dec!(750.00));
        assert_eq!(convert_consideration(dec!(-4), dec!(25), dec!(1)), dec!(-100));
    }
}
