use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corporate_actions::{self, SplitRatio, SplitTracker};
use crate::error::LedgerError;
use crate::models::{Activity, Direction, TradeEvent};
use crate::utils::{round_currency, round_fraction};

/// A cost-tagged batch of shares acquired by one purchase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionLot {
    pub instrument: String,
    pub opened: NaiveDate,
    pub quantity: Decimal, // Remaining; 0 once fully consumed
    pub unit_cost: Decimal,
    pub fee: Decimal,
}

impl PositionLot {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.unit_cost
    }

    pub fn is_closed(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Realized result of one sale, rounded for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTradeResult {
    pub instrument: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub quantity: Decimal,
    pub price: Decimal,
    pub consideration: Decimal,
    pub initial_consideration: Decimal,
    pub final_consideration: Decimal,
    pub fees: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    /// `final / initial - 1` (0.41 = 41%); `None` without a cost basis
    pub net_return: Option<Decimal>,
}

/// Lots consumed by one sale, before rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Consumption {
    pub cost_basis: Decimal,
    pub lot_fees: Decimal,
    pub lots_closed: usize,
}

/// Append-only lot arena with a FIFO cursor.
///
/// Lots before `front` are closed and kept for audit; lots from `front` on
/// are open, oldest first. Only the lot at `front` can be partially consumed.
#[derive(Debug, Clone)]
pub struct LotBook {
    instrument: String,
    lots: Vec<PositionLot>,
    front: usize,
}

impl LotBook {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            lots: Vec::new(),
            front: 0,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn push(&mut self, opened: NaiveDate, quantity: Decimal, unit_cost: Decimal, fee: Decimal) {
        self.lots.push(PositionLot {
            instrument: self.instrument.clone(),
            opened,
            quantity,
            unit_cost,
            fee,
        });
    }

    pub fn open_lots(&self) -> &[PositionLot] {
        &self.lots[self.front..]
    }

    pub fn closed_lots(&self) -> &[PositionLot] {
        &self.lots[..self.front]
    }

    pub fn open_quantity(&self) -> Decimal {
        self.open_lots().iter().map(|lot| lot.quantity).sum()
    }

    pub fn open_cost_basis(&self) -> Decimal {
        self.open_lots().iter().map(PositionLot::cost_basis).sum()
    }

    /// Consume `quantity` shares oldest-first.
    ///
    /// A lot's fee is only attributed once the lot is fully consumed. Returns
    /// the open quantity as the error when the book cannot cover the sale; the
    /// book is left untouched in that case.
    pub fn consume(&mut self, quantity: Decimal) -> Result<Consumption, Decimal> {
        let available = self.open_quantity();
        if quantity > available {
            return Err(available);
        }

        let mut remaining = quantity;
        let mut consumption = Consumption {
            cost_basis: Decimal::ZERO,
            lot_fees: Decimal::ZERO,
            lots_closed: 0,
        };

        while remaining > Decimal::ZERO {
            let lot = &mut self.lots[self.front];
            if lot.quantity <= remaining {
                consumption.cost_basis += lot.quantity * lot.unit_cost;
                consumption.lot_fees += lot.fee;
                consumption.lots_closed += 1;
                remaining -= lot.quantity;
                lot.quantity = Decimal::ZERO;
                self.front += 1;
            } else {
                consumption.cost_basis += remaining * lot.unit_cost;
                lot.quantity -= remaining;
                remaining = Decimal::ZERO;
            }
        }

        Ok(consumption)
    }

    /// Rescale every open lot by a split ratio. Closed lots are not touched.
    pub fn apply_split(&mut self, ratio: &SplitRatio) {
        for lot in &mut self.lots[self.front..] {
            corporate_actions::adjust_lot(lot, ratio);
        }
    }
}

/// FIFO matcher for one instrument's chronological event stream
pub struct FifoMatcher {
    book: LotBook,
    splits: SplitTracker,
    bought_cost: Decimal,
    consumed_cost: Decimal,
}

impl FifoMatcher {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            book: LotBook::new(instrument),
            splits: SplitTracker::default(),
            bought_cost: Decimal::ZERO,
            consumed_cost: Decimal::ZERO,
        }
    }

    /// Feed the next event. Returns a result for every ordinary sale.
    pub fn process(&mut self, event: &TradeEvent) -> Result<Option<ClosedTradeResult>, LedgerError> {
        match (event.activity, event.direction) {
            (Activity::CorporateAction, _) => {
                if let Some(ratio) = self.splits.observe(self.book.instrument(), event)? {
                    debug!(
                        "Applying {}:{} split to {} open lots of {}",
                        ratio.old_shares,
                        ratio.new_shares,
                        self.book.open_lots().len(),
                        self.book.instrument()
                    );
                    self.book.apply_split(&ratio);
                }
                Ok(None)
            }
            (Activity::OrdinaryTrade, Direction::Buy) => {
                self.add_purchase(event);
                Ok(None)
            }
            (Activity::OrdinaryTrade, Direction::Sell) => self.match_sale(event).map(Some),
        }
    }

    /// Open a new lot from a purchase
    pub fn add_purchase(&mut self, event: &TradeEvent) {
        let quantity = event.quantity.abs();
        if quantity.is_zero() {
            debug!(
                "Ignoring zero-quantity purchase of {} on {}",
                event.instrument, event.date
            );
            return;
        }

        self.bought_cost += quantity * event.price;
        self.book.push(event.date, quantity, event.price, event.fee());
    }

    /// Match a sale against open lots, oldest first
    pub fn match_sale(&mut self, event: &TradeEvent) -> Result<ClosedTradeResult, LedgerError> {
        let sell_qty = event.quantity.abs();
        let final_consideration = sell_qty * event.price;

        let consumption =
            self.book
                .consume(sell_qty)
                .map_err(|available| LedgerError::InsufficientLots {
                    instrument: event.instrument.clone(),
                    date: event.date,
                    requested: sell_qty,
                    available,
                })?;

        self.consumed_cost += consumption.cost_basis;
        let fees = event.fee() + consumption.lot_fees;

        debug!(
            "Sold {} {} on {}: cost basis {}, proceeds {}, {} lots closed",
            sell_qty,
            event.instrument,
            event.date,
            consumption.cost_basis,
            final_consideration,
            consumption.lots_closed
        );

        Ok(closed_trade(
            event,
            sell_qty,
            consumption.cost_basis,
            final_consideration,
            fees,
        ))
    }

    /// Validate end-of-stream state (no half-finished split)
    pub fn finish(&self) -> Result<(), LedgerError> {
        self.splits.finish(self.book.instrument())
    }

    pub fn book(&self) -> &LotBook {
        &self.book
    }

    /// Total cost of every purchase, unrounded. Splits preserve it.
    pub fn bought_cost(&self) -> Decimal {
        self.bought_cost
    }

    /// Cost basis consumed by sales so far, unrounded
    pub fn consumed_cost(&self) -> Decimal {
        self.consumed_cost
    }
}

fn closed_trade(
    event: &TradeEvent,
    quantity: Decimal,
    initial: Decimal,
    final_consideration: Decimal,
    fees: Decimal,
) -> ClosedTradeResult {
    let gross_profit = final_consideration - initial;
    let net_profit = gross_profit - fees;
    let net_return = if initial.is_zero() {
        None
    } else {
        Some(round_fraction(final_consideration / initial - Decimal::ONE))
    };

    ClosedTradeResult {
        instrument: event.instrument.clone(),
        date: event.date,
        time: event.time,
        quantity,
        price: event.price,
        consideration: round_currency(event.consideration),
        initial_consideration: round_currency(initial),
        final_consideration: round_currency(final_consideration),
        fees: round_currency(fees),
        gross_profit: round_currency(gross_profit),
        net_profit: round_currency(net_profit),
        net_return,
    }
}
