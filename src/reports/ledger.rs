//! Report assembly across sub-accounts.
//!
//! Closed trades are computed once per sub-account when the ledger is built.
//! Every later summary only selects rows by date and reduces them, so a new
//! window never re-runs matching and never changes a row.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use super::income::{dividend_rows, fee_rows, IncomeSummary};
use super::trades::TradeSummary;
use super::window::DateWindow;
use crate::models::{SubAccount, TradeEvent, TransactionRecord};
use crate::tax::cost_basis::ClosedTradeResult;
use crate::tax::matching::{match_events, InstrumentFailure};

/// Raw history for one sub-account
#[derive(Debug, Clone)]
pub struct AccountHistory {
    pub sub_account: SubAccount,
    pub trades: Vec<TradeEvent>,
    pub transactions: Vec<TransactionRecord>,
}

impl AccountHistory {
    pub fn new(sub_account: SubAccount) -> Self {
        Self {
            sub_account,
            trades: Vec::new(),
            transactions: Vec::new(),
        }
    }
}

/// Matched rows for one sub-account
#[derive(Debug, Clone)]
pub struct AccountLedger {
    pub sub_account: SubAccount,
    pub closed_trades: Vec<ClosedTradeResult>,
    pub failures: Vec<InstrumentFailure>,
    pub transactions: Vec<TransactionRecord>,
}

/// Immutable set of closed trades and transactions for a report
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: BTreeMap<SubAccount, AccountLedger>,
}

/// Aggregates for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub window: DateWindow,
    pub trades: BTreeMap<SubAccount, TradeSummary>,
    pub combined: TradeSummary,
    pub income: IncomeSummary,
}

impl Ledger {
    /// Match every sub-account's trades over its whole history.
    ///
    /// Histories for the same sub-account are concatenated. Each later
    /// history's `sequence` numbers are shifted past the earlier ones, so rows
    /// sharing a timestamp across files order by history position.
    pub fn build(histories: Vec<AccountHistory>) -> Self {
        let mut merged: BTreeMap<SubAccount, AccountHistory> = BTreeMap::new();
        for history in histories {
            let entry = merged
                .entry(history.sub_account)
                .or_insert_with(|| AccountHistory::new(history.sub_account));
            let offset = entry.trades.len();
            entry
                .trades
                .extend(history.trades.into_iter().map(|mut event| {
                    event.sequence += offset;
                    event
                }));
            entry.transactions.extend(history.transactions);
        }

        let accounts = merged
            .into_iter()
            .map(|(sub_account, history)| {
                let outcome = match_events(&history.trades);
                let mut closed_trades = outcome.results;
                closed_trades.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));

                info!(
                    "{}: {} trade events, {} closed trades, {} rejected instruments, {} transactions",
                    sub_account.label(),
                    history.trades.len(),
                    closed_trades.len(),
                    outcome.failures.len(),
                    history.transactions.len()
                );

                let ledger = AccountLedger {
                    sub_account,
                    closed_trades,
                    failures: outcome.failures,
                    transactions: history.transactions,
                };
                (sub_account, ledger)
            })
            .collect();

        Self { accounts }
    }

    pub fn account(&self, sub_account: SubAccount) -> Option<&AccountLedger> {
        self.accounts.get(&sub_account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountLedger> {
        self.accounts.values()
    }

    /// Closed trades of one sub-account inside the window
    pub fn closed_trades(
        &self,
        sub_account: SubAccount,
        window: &DateWindow,
    ) -> Vec<&ClosedTradeResult> {
        self.account(sub_account)
            .map(|account| window.filter(&account.closed_trades))
            .unwrap_or_default()
    }

    /// Instruments rejected during matching, with their sub-account
    pub fn failures(&self) -> Vec<(SubAccount, &InstrumentFailure)> {
        self.accounts
            .values()
            .flat_map(|a| a.failures.iter().map(move |f| (a.sub_account, f)))
            .collect()
    }

    fn transactions_in(&self, window: &DateWindow) -> Vec<&TransactionRecord> {
        self.accounts
            .values()
            .flat_map(|a| window.filter(&a.transactions))
            .collect()
    }

    /// Dividend rows from all sub-accounts inside the window
    pub fn dividends(&self, window: &DateWindow) -> Vec<&TransactionRecord> {
        dividend_rows(self.transactions_in(window))
    }

    /// Fee rows from all sub-accounts inside the window
    pub fn fees(&self, window: &DateWindow) -> Vec<&TransactionRecord> {
        fee_rows(self.transactions_in(window))
    }

    /// Window covering every closed trade and transaction
    pub fn full_window(&self) -> Option<DateWindow> {
        self.accounts
            .values()
            .flat_map(|a| {
                [
                    DateWindow::spanning(&a.closed_trades),
                    DateWindow::spanning(&a.transactions),
                ]
            })
            .flatten()
            .reduce(|acc, w| acc.union(&w))
    }

    /// Recompute every aggregate for a window
    pub fn summarize(&self, window: &DateWindow) -> ReportSummary {
        let trades: BTreeMap<SubAccount, TradeSummary> = SubAccount::all()
            .into_iter()
            .map(|account| {
                let rows = self.closed_trades(account, window);
                (account, TradeSummary::from_results(rows))
            })
            .collect();

        let combined = trades
            .values()
            .fold(TradeSummary::default(), |acc, s| acc.merge(s));

        let income = IncomeSummary::from_records(self.transactions_in(window));

        ReportSummary {
            window: *window,
            trades,
            combined,
            income,
        }
    }
}
