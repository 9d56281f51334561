use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use capgains::models::SubAccount;
use capgains::reports::{DateWindow, Ledger};
use capgains::tax::tax_year::{TaxYear, TaxYearStart};

pub mod formatters;

#[derive(Parser)]
#[command(name = "capgains")]
#[command(
    version,
    about = "Realized gains, dividends and fees for UK share dealing and ISA accounts"
)]
#[command(
    long_about = "Reconcile broker trade and transaction histories: FIFO-match sales against purchases (split-aware), then summarize realized gains, dividends and fees for a tax year or any date range."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to a config.toml (overrides $CAPGAINS_CONFIG)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trade, dividend and fee summary for a window
    Report {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        inputs: InputArgs,
    },

    /// List closed trades for a window
    Trades {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        inputs: InputArgs,

        /// Only show one sub-account
        #[arg(short, long, value_enum)]
        account: Option<AccountArg>,
    },

    /// List dividend payments for a window
    Dividends {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        inputs: InputArgs,

        /// Only show one sub-account
        #[arg(short, long, value_enum)]
        account: Option<AccountArg>,
    },

    /// List fee charges (commission, Section 31, custody) for a window
    Fees {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        inputs: InputArgs,

        /// Only show one sub-account
        #[arg(short, long, value_enum)]
        account: Option<AccountArg>,
    },
}

/// Reporting window selection. Defaults to the last complete tax year.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Tax year, e.g. 2020 or 2020/21 (6 April 2020 to 5 April 2021)
    #[arg(long, conflicts_with_all = ["from", "to", "all"])]
    pub tax_year: Option<String>,

    /// Window start (YYYY-MM-DD), inclusive
    #[arg(long, requires = "to", conflicts_with = "all")]
    pub from: Option<String>,

    /// Window end (YYYY-MM-DD), inclusive
    #[arg(long, requires = "from", conflicts_with = "all")]
    pub to: Option<String>,

    /// Cover the whole history
    #[arg(long)]
    pub all: bool,
}

/// History files. Each is optional; a missing file contributes nothing.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Share dealing trade history CSV
    #[arg(long, value_name = "FILE")]
    pub sd_trades: Option<PathBuf>,

    /// ISA trade history CSV
    #[arg(long, value_name = "FILE")]
    pub isa_trades: Option<PathBuf>,

    /// Share dealing transaction history CSV
    #[arg(long, value_name = "FILE")]
    pub sd_transactions: Option<PathBuf>,

    /// ISA transaction history CSV
    #[arg(long, value_name = "FILE")]
    pub isa_transactions: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountArg {
    Sd,
    Isa,
}

impl From<AccountArg> for SubAccount {
    fn from(arg: AccountArg) -> Self {
        match arg {
            AccountArg::Sd => SubAccount::ShareDealing,
            AccountArg::Isa => SubAccount::Isa,
        }
    }
}

impl InputArgs {
    pub fn trade_files(&self) -> Vec<(SubAccount, &PathBuf)> {
        [
            (SubAccount::ShareDealing, self.sd_trades.as_ref()),
            (SubAccount::Isa, self.isa_trades.as_ref()),
        ]
        .into_iter()
        .filter_map(|(account, path)| path.map(|p| (account, p)))
        .collect()
    }

    pub fn transaction_files(&self) -> Vec<(SubAccount, &PathBuf)> {
        [
            (SubAccount::ShareDealing, self.sd_transactions.as_ref()),
            (SubAccount::Isa, self.isa_transactions.as_ref()),
        ]
        .into_iter()
        .filter_map(|(account, path)| path.map(|p| (account, p)))
        .collect()
    }
}

impl WindowArgs {
    /// Resolve to a concrete window. `today` picks the default tax year.
    pub fn resolve(&self, rule: TaxYearStart, today: NaiveDate, ledger: &Ledger) -> Result<DateWindow> {
        if let Some(ref year) = self.tax_year {
            return Ok(TaxYear::parse(year, rule)?.window()?);
        }

        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            let start = parse_window_date(from)?;
            let end = parse_window_date(to)?;
            return Ok(DateWindow::new(start, end)?);
        }

        let previous = TaxYear::previous(today, rule).window()?;
        if self.all {
            return Ok(ledger.full_window().unwrap_or(previous));
        }
        Ok(previous)
    }
}

fn parse_window_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window_is_previous_tax_year() {
        let window = WindowArgs::default()
            .resolve(TaxYearStart::default(), date(2021, 10, 18), &Ledger::default())
            .unwrap();
        assert_eq!(window.start, date(2020, 4, 6));
        assert_eq!(window.end, date(2021, 4, 5));
    }

    #[test]
    fn test_explicit_range_is_inclusive_and_validated() {
        let args = WindowArgs {
            from: Some("2021-01-01".to_string()),
            to: Some("2021-01-31".to_string()),
            ..Default::default()
        };
        let window = args
            .resolve(TaxYearStart::default(), date(2021, 10, 18), &Ledger::default())
            .unwrap();
        assert!(window.contains(date(2021, 1, 31)));

        let reversed = WindowArgs {
            from: Some("2021-02-01".to_string()),
            to: Some("2021-01-31".to_string()),
            ..Default::default()
        };
        let err = reversed
            .resolve(TaxYearStart::default(), date(2021, 10, 18), &Ledger::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid date window"));
    }

    #[test]
    fn test_tax_year_flag() {
        let args = WindowArgs {
            tax_year: Some("2019/20".to_string()),
            ..Default::default()
        };
        let window = args
            .resolve(TaxYearStart::default(), date(2021, 10, 18), &Ledger::default())
            .unwrap();
        assert_eq!(window.start, date(2019, 4, 6));
        assert_eq!(window.end, date(2020, 4, 5));
    }

    #[test]
    fn test_cli_parses_report_flags() {
        let cli = Cli::try_parse_from([
            "capgains",
            "--json",
            "report",
            "--tax-year",
            "2020",
            "--sd-trades",
            "sd.csv",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Report { window, inputs } => {
                assert_eq!(window.tax_year.as_deref(), Some("2020"));
                assert_eq!(inputs.trade_files().len(), 1);
                assert!(inputs.transaction_files().is_empty());
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn test_cli_parses_income_subcommands() {
        let cli = Cli::try_parse_from([
            "capgains",
            "dividends",
            "--all",
            "--account",
            "sd",
            "--sd-transactions",
            "sd_tx.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Dividends { window, inputs, account } => {
                assert!(window.all);
                assert_eq!(account, Some(AccountArg::Sd));
                assert_eq!(inputs.transaction_files().len(), 1);
            }
            _ => panic!("expected dividends"),
        }

        let cli = Cli::try_parse_from(["capgains", "fees", "--tax-year", "2020/21"]).unwrap();
        assert!(matches!(cli.command, Commands::Fees { account: None, .. }));
    }

    #[test]
    fn test_tax_year_conflicts_with_range() {
        let result = Cli::try_parse_from([
            "capgains", "trades", "--tax-year", "2020", "--from", "2020-01-01", "--to", "2020-02-01",
        ]);
        assert!(result.is_err());
    }
}
