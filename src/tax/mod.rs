// Tax module - FIFO cost basis, commission normalization, tax years

pub mod cost_basis;
pub mod matching;
pub mod normalizer;
pub mod tax_year;

pub use cost_basis::{ClosedTradeResult, FifoMatcher, LotBook, PositionLot};
pub use matching::{match_events, match_instrument, InstrumentFailure, MatchOutcome};
pub use normalizer::{convert_consideration, CommissionPolicy};
pub use tax_year::{TaxYear, TaxYearStart};
