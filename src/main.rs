mod cli;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use capgains::config::Settings;
use capgains::importers::{load_trade_history, load_transaction_history, TradeImportOptions};
use capgains::models::{SubAccount, TransactionRecord};
use capgains::reports::{AccountHistory, Ledger};
use cli::formatters::{self, FailureView};
use cli::{AccountArg, Cli, Commands, InputArgs, WindowArgs};

fn main() -> Result<()> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Report { window, inputs } => handle_report(&settings, &window, &inputs, cli.json),
        Commands::Trades {
            window,
            inputs,
            account,
        } => handle_trades(&settings, &window, &inputs, account, cli.json),
        Commands::Dividends {
            window,
            inputs,
            account,
        } => handle_income(&settings, &window, &inputs, account, IncomeKind::Dividends, cli.json),
        Commands::Fees {
            window,
            inputs,
            account,
        } => handle_income(&settings, &window, &inputs, account, IncomeKind::Fees, cli.json),
    }
}

/// Load every given history file and match it once
fn build_ledger(settings: &Settings, inputs: &InputArgs) -> Result<Ledger> {
    let options = TradeImportOptions {
        policy: settings.commission_policy(),
        newest_first: settings.import.newest_first,
    };

    let mut histories: Vec<AccountHistory> = Vec::new();
    for (account, path) in inputs.trade_files() {
        let mut history = AccountHistory::new(account);
        history.trades = load_trade_history(path, &options)?;
        histories.push(history);
    }
    for (account, path) in inputs.transaction_files() {
        let mut history = AccountHistory::new(account);
        history.transactions = load_transaction_history(path, account)?;
        histories.push(history);
    }

    Ok(Ledger::build(histories))
}

fn failure_views(ledger: &Ledger) -> Vec<FailureView<'_>> {
    ledger
        .failures()
        .into_iter()
        .map(|(sub_account, failure)| FailureView {
            sub_account,
            failure,
        })
        .collect()
}

fn handle_report(
    settings: &Settings,
    window_args: &WindowArgs,
    inputs: &InputArgs,
    json_output: bool,
) -> Result<()> {
    let ledger = build_ledger(settings, inputs)?;
    let window = window_args.resolve(settings.tax_year_start(), Local::now().date_naive(), &ledger)?;
    info!("Reporting window {} to {}", window.start, window.end);

    let summary = ledger.summarize(&window);
    let failures = failure_views(&ledger);

    if json_output {
        println!("{}", formatters::format_report_json(&summary, &failures)?);
    } else {
        print!("{}", formatters::format_report_table(&summary, &failures));
    }
    Ok(())
}

fn handle_trades(
    settings: &Settings,
    window_args: &WindowArgs,
    inputs: &InputArgs,
    account: Option<AccountArg>,
    json_output: bool,
) -> Result<()> {
    let ledger = build_ledger(settings, inputs)?;
    let window = window_args.resolve(settings.tax_year_start(), Local::now().date_naive(), &ledger)?;

    let accounts: Vec<SubAccount> = match account {
        Some(arg) => vec![arg.into()],
        None => SubAccount::all().to_vec(),
    };

    let mut trades: Vec<_> = accounts
        .iter()
        .flat_map(|&sub_account| {
            ledger
                .closed_trades(sub_account, &window)
                .into_iter()
                .map(move |trade| (sub_account, trade))
        })
        .collect();
    trades.sort_by(|(_, a), (_, b)| (a.date, a.time).cmp(&(b.date, b.time)));

    let failures: Vec<FailureView<'_>> = failure_views(&ledger)
        .into_iter()
        .filter(|view| accounts.contains(&view.sub_account))
        .collect();

    if json_output {
        println!("{}", formatters::format_trades_json(&window, &trades, &failures)?);
    } else {
        print!("{}", formatters::format_trades_table(&window, &trades, &failures));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum IncomeKind {
    Dividends,
    Fees,
}

fn handle_income(
    settings: &Settings,
    window_args: &WindowArgs,
    inputs: &InputArgs,
    account: Option<AccountArg>,
    kind: IncomeKind,
    json_output: bool,
) -> Result<()> {
    let ledger = build_ledger(settings, inputs)?;
    let window = window_args.resolve(settings.tax_year_start(), Local::now().date_naive(), &ledger)?;

    let rows = match kind {
        IncomeKind::Dividends => ledger.dividends(&window),
        IncomeKind::Fees => ledger.fees(&window),
    };
    let rows: Vec<&TransactionRecord> = match account {
        Some(arg) => {
            let sub_account = SubAccount::from(arg);
            rows.into_iter()
                .filter(|r| r.sub_account == sub_account)
                .collect()
        }
        None => rows,
    };

    let output = match (kind, json_output) {
        (IncomeKind::Dividends, true) => formatters::format_dividends_json(&window, &rows)?,
        (IncomeKind::Dividends, false) => formatters::format_dividends_table(&window, &rows),
        (IncomeKind::Fees, true) => formatters::format_fees_json(&window, &rows)?,
        (IncomeKind::Fees, false) => formatters::format_fees_table(&window, &rows),
    };
    if json_output {
        println!("{}", output);
    } else {
        print!("{}", output);
    }
    Ok(())
}
