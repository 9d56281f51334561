//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use capgains::models::{SubAccount, TransactionCategory, TransactionRecord};
use capgains::reports::{DateWindow, IncomeSummary, ReportSummary, TradeSummaryFigures};
use capgains::tax::cost_basis::ClosedTradeResult;
use capgains::tax::matching::InstrumentFailure;
use capgains::utils::{format_currency, format_percentage, round_currency};

/// Rejected instrument with the sub-account it came from
#[derive(Debug, Serialize)]
pub struct FailureView<'a> {
    pub sub_account: SubAccount,
    #[serde(flatten)]
    pub failure: &'a InstrumentFailure,
}

fn colored_money(value: Decimal) -> String {
    let text = format_currency(value);
    if value >= Decimal::ZERO {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn colored_pct(value: Option<Decimal>) -> String {
    let text = format_percentage(value);
    match value {
        Some(pct) if pct < Decimal::ZERO => text.red().to_string(),
        Some(_) => text.green().to_string(),
        None => text.bright_black().to_string(),
    }
}

fn window_title(window: &DateWindow) -> String {
    format!(
        "{} to {}",
        window.start.format("%d %b %Y"),
        window.end.format("%d %b %Y")
    )
}

/// Warnings for instruments whose history could not be matched
pub fn format_failures(failures: &[FailureView<'_>]) -> String {
    let mut output = String::new();
    for view in failures {
        output.push_str(&format!(
            "{} {} ({}): {}\n",
            "⚠".yellow().bold(),
            view.failure.instrument.bold(),
            view.sub_account.label(),
            view.failure.error
        ));
    }
    output
}

/// Format a report summary for terminal table output
pub fn format_report_table(summary: &ReportSummary, failures: &[FailureView<'_>]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Realized gains, {}\n\n",
        "📊".cyan().bold(),
        window_title(&summary.window)
    ));

    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Account")]
        account: String,
        #[tabled(rename = "Trades")]
        trades: usize,
        #[tabled(rename = "Invested")]
        invested: String,
        #[tabled(rename = "Proceeds")]
        proceeds: String,
        #[tabled(rename = "Fees")]
        fees: String,
        #[tabled(rename = "Net Profit")]
        net_profit: String,
        #[tabled(rename = "Return %")]
        return_pct: String,
    }

    let row = |label: &str, figures: TradeSummaryFigures| SummaryRow {
        account: label.to_string(),
        trades: figures.trades,
        invested: format_currency(figures.invested),
        proceeds: format_currency(figures.proceeds),
        fees: format_currency(figures.fees),
        net_profit: colored_money(figures.net_profit),
        return_pct: colored_pct(figures.net_profit_pct),
    };

    let mut rows: Vec<SummaryRow> = summary
        .trades
        .iter()
        .map(|(account, trades)| row(account.label(), trades.into()))
        .collect();
    rows.push(row("Combined", (&summary.combined).into()));

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{} Dividends\n", "━".repeat(40).bright_black()));
    for (account, amount) in &summary.income.dividends {
        output.push_str(&format!(
            "{:<28} {}\n",
            format!("{}:", account.label()).bold(),
            format_currency(*amount)
        ));
    }
    output.push_str(&format!(
        "{:<28} {}\n",
        "Total:".bold(),
        format_currency(summary.income.dividend_total())
    ));

    output.push_str(&format!("\n{} Fees\n", "━".repeat(40).bright_black()));
    for (category, amount) in &summary.income.fees {
        output.push_str(&format!(
            "{:<28} {}\n",
            format!("{}:", category.label()).bold(),
            format_currency(*amount)
        ));
    }
    output.push_str(&format!(
        "{:<28} {}\n",
        "Total:".bold(),
        format_currency(summary.income.fee_total())
    ));

    if !failures.is_empty() {
        output.push('\n');
        output.push_str(&format_failures(failures));
    }

    output
}

/// Format a report summary for JSON output
pub fn format_report_json(summary: &ReportSummary, failures: &[FailureView<'_>]) -> Result<String> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        window: DateWindow,
        trades: BTreeMap<SubAccount, TradeSummaryFigures>,
        combined: TradeSummaryFigures,
        dividends: &'a BTreeMap<SubAccount, Decimal>,
        dividend_total: Decimal,
        fees: &'a BTreeMap<TransactionCategory, Decimal>,
        fee_total: Decimal,
        failures: &'a [FailureView<'a>],
    }

    let report = JsonReport {
        window: summary.window,
        trades: summary
            .trades
            .iter()
            .map(|(account, trades)| (*account, TradeSummaryFigures::from(trades)))
            .collect(),
        combined: (&summary.combined).into(),
        dividends: &summary.income.dividends,
        dividend_total: summary.income.dividend_total(),
        fees: &summary.income.fees,
        fee_total: summary.income.fee_total(),
        failures,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Format closed trades for terminal table output
pub fn format_trades_table(
    window: &DateWindow,
    trades: &[(SubAccount, &ClosedTradeResult)],
    failures: &[FailureView<'_>],
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Closed trades, {}\n\n",
        "📈".cyan().bold(),
        window_title(window)
    ));

    if trades.is_empty() {
        output.push_str(&format!("{} No closed trades in this window\n", "ℹ".blue().bold()));
    } else {
        #[derive(Tabled)]
        struct TradeRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Account")]
            account: String,
            #[tabled(rename = "Instrument")]
            instrument: String,
            #[tabled(rename = "Quantity")]
            quantity: String,
            #[tabled(rename = "Price")]
            price: String,
            #[tabled(rename = "Cost")]
            initial: String,
            #[tabled(rename = "Proceeds")]
            proceeds: String,
            #[tabled(rename = "Fees")]
            fees: String,
            #[tabled(rename = "Net Profit")]
            net_profit: String,
            #[tabled(rename = "Return %")]
            return_pct: String,
        }

        let rows: Vec<TradeRow> = trades
            .iter()
            .map(|(account, t)| TradeRow {
                date: format!("{} {}", t.date.format("%Y-%m-%d"), t.time.format("%H:%M")),
                account: account.label().to_string(),
                instrument: t.instrument.clone(),
                quantity: t.quantity.normalize().to_string(),
                price: t.price.normalize().to_string(),
                initial: format_currency(t.initial_consideration),
                proceeds: format_currency(t.final_consideration),
                fees: format_currency(t.fees),
                net_profit: colored_money(t.net_profit),
                return_pct: colored_pct(t.net_return.map(|r| r * Decimal::ONE_HUNDRED)),
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        // Right-align everything after Date, Account and Instrument
        table.modify(Columns::new(3..), Alignment::right());
        output.push_str(&table.to_string());
        output.push('\n');
    }

    if !failures.is_empty() {
        output.push('\n');
        output.push_str(&format_failures(failures));
    }

    output
}

/// Format closed trades for JSON output
pub fn format_trades_json(
    window: &DateWindow,
    trades: &[(SubAccount, &ClosedTradeResult)],
    failures: &[FailureView<'_>],
) -> Result<String> {
    #[derive(Serialize)]
    struct JsonTrade<'a> {
        sub_account: SubAccount,
        #[serde(flatten)]
        trade: &'a ClosedTradeResult,
    }

    #[derive(Serialize)]
    struct JsonTrades<'a> {
        window: &'a DateWindow,
        trades: Vec<JsonTrade<'a>>,
        failures: &'a [FailureView<'a>],
    }

    let report = JsonTrades {
        window,
        trades: trades
            .iter()
            .map(|(sub_account, trade)| JsonTrade {
                sub_account: *sub_account,
                trade: *trade,
            })
            .collect(),
        failures,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

fn optional_decimal(value: Option<Decimal>) -> String {
    value
        .map(|v| v.normalize().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format dividend rows for terminal table output
pub fn format_dividends_table(window: &DateWindow, rows: &[&TransactionRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Dividends, {}\n\n",
        "💷".cyan().bold(),
        window_title(window)
    ));

    if rows.is_empty() {
        output.push_str(&format!("{} No dividends in this window\n", "ℹ".blue().bold()));
        return output;
    }

    #[derive(Tabled)]
    struct DividendRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Account")]
        account: String,
        #[tabled(rename = "Instrument")]
        instrument: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "FX Rate")]
        conversion_rate: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let table_rows: Vec<DividendRow> = rows
        .iter()
        .map(|r| {
            let detail = r.dividend.as_ref();
            DividendRow {
                date: r.date.format("%Y-%m-%d").to_string(),
                account: r.sub_account.label().to_string(),
                instrument: r.instrument.clone().unwrap_or_default(),
                quantity: optional_decimal(detail.map(|d| d.quantity)),
                price: optional_decimal(detail.map(|d| d.price)),
                conversion_rate: optional_decimal(detail.and_then(|d| d.conversion_rate)),
                amount: format_currency(r.amount),
            }
        })
        .collect();

    let mut table = Table::new(&table_rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    output.push_str(&table.to_string());

    let totals = IncomeSummary::from_records(rows.iter().copied());
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Total:".bold(),
        format_currency(totals.dividend_total())
    ));

    output
}

/// Format dividend rows for JSON output
pub fn format_dividends_json(window: &DateWindow, rows: &[&TransactionRecord]) -> Result<String> {
    #[derive(Serialize)]
    struct JsonDividend<'a> {
        date: chrono::NaiveDate,
        sub_account: SubAccount,
        instrument: Option<&'a str>,
        quantity: Option<Decimal>,
        price: Option<Decimal>,
        conversion_rate: Option<Decimal>,
        amount: Decimal,
    }

    #[derive(Serialize)]
    struct JsonDividends<'a> {
        window: &'a DateWindow,
        dividends: Vec<JsonDividend<'a>>,
        total: Decimal,
    }

    let totals = IncomeSummary::from_records(rows.iter().copied());
    let report = JsonDividends {
        window,
        dividends: rows
            .iter()
            .map(|r| {
                let detail = r.dividend.as_ref();
                JsonDividend {
                    date: r.date,
                    sub_account: r.sub_account,
                    instrument: r.instrument.as_deref(),
                    quantity: detail.map(|d| d.quantity),
                    price: detail.map(|d| d.price),
                    conversion_rate: detail.and_then(|d| d.conversion_rate),
                    amount: round_currency(r.amount),
                }
            })
            .collect(),
        total: totals.dividend_total(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Format fee rows for terminal table output
pub fn format_fees_table(window: &DateWindow, rows: &[&TransactionRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Fees, {}\n\n",
        "🧾".cyan().bold(),
        window_title(window)
    ));

    if rows.is_empty() {
        output.push_str(&format!("{} No fees in this window\n", "ℹ".blue().bold()));
        return output;
    }

    #[derive(Tabled)]
    struct FeeRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Account")]
        account: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Instrument")]
        instrument: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let table_rows: Vec<FeeRow> = rows
        .iter()
        .map(|r| FeeRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            account: r.sub_account.label().to_string(),
            category: r.category.label().to_string(),
            instrument: r.instrument.clone().unwrap_or_default(),
            amount: format_currency(r.amount),
        })
        .collect();

    let mut table = Table::new(&table_rows);
    table.with(Style::modern());
    table.modify(Columns::new(4..), Alignment::right());
    output.push_str(&table.to_string());

    let totals = IncomeSummary::from_records(rows.iter().copied());
    output.push('\n');
    for (category, amount) in &totals.fees {
        output.push_str(&format!(
            "{:<28} {}\n",
            format!("{}:", category.label()).bold(),
            format_currency(*amount)
        ));
    }
    output.push_str(&format!(
        "{:<28} {}\n",
        "Total:".bold(),
        format_currency(totals.fee_total())
    ));

    output
}

/// Format fee rows for JSON output
pub fn format_fees_json(window: &DateWindow, rows: &[&TransactionRecord]) -> Result<String> {
    #[derive(Serialize)]
    struct JsonFee<'a> {
        date: chrono::NaiveDate,
        sub_account: SubAccount,
        category: TransactionCategory,
        instrument: Option<&'a str>,
        amount: Decimal,
    }

    #[derive(Serialize)]
    struct JsonFees<'a> {
        window: &'a DateWindow,
        fees: Vec<JsonFee<'a>>,
        totals: BTreeMap<TransactionCategory, Decimal>,
        total: Decimal,
    }

    let totals = IncomeSummary::from_records(rows.iter().copied());
    let report = JsonFees {
        window,
        fees: rows
            .iter()
            .map(|r| JsonFee {
                date: r.date,
                sub_account: r.sub_account,
                category: r.category,
                instrument: r.instrument.as_deref(),
                amount: round_currency(r.amount),
            })
            .collect(),
        total: totals.fee_total(),
        totals: totals.fees,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capgains::reports::{AccountHistory, Ledger};
    use chrono::NaiveDate;

    fn empty_summary() -> ReportSummary {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2020, 4, 6).unwrap(),
            NaiveDate::from_ymd_opt(2021, 4, 5).unwrap(),
        )
        .unwrap();
        Ledger::build(vec![AccountHistory::new(SubAccount::Isa)]).summarize(&window)
    }

    #[test]
    fn test_empty_report_shows_zero_totals_and_na() {
        colored::control::set_override(false);
        let output = format_report_table(&empty_summary(), &[]);
        assert!(output.contains("06 Apr 2020 to 05 Apr 2021"));
        assert!(output.contains("Combined"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Section 31 Fee:"));
    }

    #[test]
    fn test_report_json_has_null_percentage_without_trades() {
        let json = format_report_json(&empty_summary(), &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["combined"]["net_profit_pct"].is_null());
        assert_eq!(value["window"]["start"], "2020-04-06");
        assert!(value["failures"].as_array().unwrap().is_empty());
        assert!(value["fees"].get("CUSTODY_FEE").is_some());
    }

    #[test]
    fn test_dividend_table_shows_missing_detail_as_dash() {
        colored::control::set_override(false);
        let window = empty_summary().window;
        let record = TransactionRecord {
            date: NaiveDate::from_ymd_opt(2020, 9, 1).unwrap(),
            sub_account: SubAccount::ShareDealing,
            category: TransactionCategory::Dividend,
            amount: Decimal::new(1250, 2),
            instrument: Some("Rolls-Royce Holdings".to_string()),
            dividend: None,
        };
        let output = format_dividends_table(&window, &[&record]);
        assert!(output.contains("Rolls-Royce Holdings"));
        assert!(output.contains(" - "));
        assert!(output.contains("12.50"));

        let empty = format_fees_table(&window, &[]);
        assert!(empty.contains("No fees in this window"));
    }
}
