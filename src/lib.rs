//! Capgains - UK share dealing and ISA gain reconciliation
//!
//! This library matches sales against earlier purchases (FIFO, split-aware),
//! and summarizes realized gains, dividends and fees over a reporting window
//! such as a UK tax year.

pub mod config;
pub mod corporate_actions;
pub mod error;
pub mod importers;
pub mod models;
pub mod reports;
pub mod tax;
pub mod utils;
