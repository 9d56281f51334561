// Corporate actions module - Split detection and lot adjustment

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::{Direction, TradeEvent};
use crate::tax::cost_basis::PositionLot;

/// Share count before and after a split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRatio {
    pub old_shares: Decimal,
    pub new_shares: Decimal,
}

impl SplitRatio {
    /// Multiplier applied to lot quantities (2 for a 2-for-1 split)
    pub fn factor(&self) -> Decimal {
        self.new_shares / self.old_shares
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingSplit {
    date: NaiveDate,
    old_shares: Decimal,
}

/// Pairs corporate-action rows into splits.
///
/// The broker reports a split as a SELL of the old holding followed by a BUY
/// of the new one. The SELL is remembered until its BUY arrives.
#[derive(Debug, Default)]
pub struct SplitTracker {
    pending: Option<PendingSplit>,
}

impl SplitTracker {
    /// Observe a corporate-action row. Returns the ratio once a pair completes.
    pub fn observe(
        &mut self,
        instrument: &str,
        event: &TradeEvent,
    ) -> Result<Option<SplitRatio>, LedgerError> {
        let shares = event.quantity.abs();
        match event.direction {
            Direction::Sell => {
                if let Some(pending) = self.pending {
                    return Err(malformed(
                        instrument,
                        event.date,
                        format!(
                            "second split SELL while the one from {} has no matching BUY",
                            pending.date
                        ),
                    ));
                }
                if shares.is_zero() {
                    return Err(malformed(
                        instrument,
                        event.date,
                        "split SELL with zero shares".to_string(),
                    ));
                }
                self.pending = Some(PendingSplit {
                    date: event.date,
                    old_shares: shares,
                });
                Ok(None)
            }
            Direction::Buy => {
                let pending = self.pending.take().ok_or_else(|| {
                    malformed(
                        instrument,
                        event.date,
                        "split BUY without a preceding SELL".to_string(),
                    )
                })?;
                if shares.is_zero() {
                    return Err(malformed(
                        instrument,
                        event.date,
                        "split BUY with zero shares".to_string(),
                    ));
                }
                Ok(Some(SplitRatio {
                    old_shares: pending.old_shares,
                    new_shares: shares,
                }))
            }
        }
    }

    /// Fails if a split SELL is still waiting for its BUY
    pub fn finish(&self, instrument: &str) -> Result<(), LedgerError> {
        match self.pending {
            Some(pending) => Err(malformed(
                instrument,
                pending.date,
                "split SELL without a matching BUY".to_string(),
            )),
            None => Ok(()),
        }
    }
}

fn malformed(instrument: &str, date: NaiveDate, detail: String) -> LedgerError {
    LedgerError::MalformedCorporateAction {
        instrument: instrument.to_string(),
        date,
        detail,
    }
}

/// Apply a split to one open lot, keeping quantity × unit cost unchanged.
///
/// new_qty  = old_qty × (new_shares / old_shares)
/// new_cost = old_cost × (old_shares / new_shares)
pub fn adjust_lot(lot: &mut PositionLot, ratio: &SplitRatio) {
    let old_total = lot.cost_basis();

    lot.quantity = lot.quantity * ratio.new_shares / ratio.old_shares;
    lot.unit_cost = lot.unit_cost * ratio.old_shares / ratio.new_shares;

    let diff = (lot.cost_basis() - old_total).abs();
    let tolerance = Decimal::new(1, 2); // 1p tolerance
    if diff > tolerance {
        tracing::warn!(
            "Cost basis changed for {} lot opened {}: {} -> {} (diff: {})",
            lot.instrument,
            lot.opened,
            old_total,
            lot.cost_basis(),
            diff
        );
    }
}
