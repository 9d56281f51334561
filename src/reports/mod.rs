// Reports module - Windowed trade, dividend and fee summaries

pub mod income;
pub mod ledger;
pub mod trades;
pub mod window;

pub use income::{dividend_rows, fee_rows, IncomeSummary};
pub use ledger::{AccountHistory, AccountLedger, Ledger, ReportSummary};
pub use trades::{TradeSummary, TradeSummaryFigures};
pub use window::{DateWindow, Dated};
