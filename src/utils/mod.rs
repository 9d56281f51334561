//! Utility functions for rounding and formatting
//!
//! Money is rounded only when a figure leaves the engine; these helpers are
//! the single place that rounding and display conventions live.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a currency figure to pence for emission.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a return fraction (0.4063 = 40.63%) for emission.
pub fn round_fraction(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "£ " prefix
    Gbp,
    /// No currency symbol (for table cells)
    None,
}

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using UK conventions:
/// - Thousands separator: `,`
/// - Decimal separator: `.`
///
/// # Examples
/// ```
/// use capgains::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234.56), 0, CurrencySymbol::Gbp),
///     "£ 1,234.56"
/// );
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234), 12, CurrencySymbol::None),
///     "    1,234.00"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let rounded = round_currency(value);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::Gbp => "£ ",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{}{}.{}", prefix, sign, with_separators, decimal_part);

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format as pounds sterling with symbol: "£ 1,234.56"
///
/// # Examples
/// ```
/// use capgains::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "£ 1,234.56");
/// assert_eq!(format_currency(dec!(-500)), "£ -500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::Gbp)
}

/// Format a percentage figure, or "N/A" when it is undefined.
///
/// # Examples
/// ```
/// use capgains::utils::format_percentage;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percentage(Some(dec!(-2.2222))), "-2.22%");
/// assert_eq!(format_percentage(None), "N/A");
/// ```
pub fn format_percentage(value: Option<Decimal>) -> String {
    match value {
        Some(pct) => format!(
            "{:.2}%",
            pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(dec!(1.005)), dec!(1.01));
        assert_eq!(round_currency(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_currency(dec!(1600)), dec!(1600));
    }

    #[test]
    fn test_round_fraction() {
        assert_eq!(round_fraction(dec!(0.40625)), dec!(0.4063));
        assert_eq!(round_fraction(dec!(-0.022222)), dec!(-0.0222));
    }

    #[test]
    fn test_format_currency_basic() {
        assert_eq!(format_currency(dec!(1234.56)), "£ 1,234.56");
        assert_eq!(format_currency(dec!(0.99)), "£ 0.99");
        assert_eq!(format_currency(dec!(1000000)), "£ 1,000,000.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(dec!(-1234.56)), "£ -1,234.56");
        assert_eq!(format_currency(dec!(-0.01)), "£ -0.01");
    }

    #[test]
    fn test_format_rounds_instead_of_truncating() {
        assert_eq!(format_currency(dec!(1.999)), "£ 2.00");
        assert_eq!(format_currency(dec!(1.234)), "£ 1.23");
    }

    #[test]
    fn test_format_with_width() {
        let result = format_currency_with_width(dec!(100), 12, CurrencySymbol::Gbp);
        assert_eq!(result, "    £ 100.00");

        let result2 = format_currency_with_width(dec!(1000000), 5, CurrencySymbol::None);
        assert_eq!(result2, "1,000,000.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(dec!(40.625))), "40.63%");
        assert_eq!(format_percentage(Some(dec!(0))), "0.00%");
        assert_eq!(format_percentage(None), "N/A");
    }
}
