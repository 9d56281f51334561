//! Per-instrument matching driver.
//!
//! Splits a mixed trade history into instrument streams, puts each stream in
//! chronological order and runs the FIFO matcher over it. A stream that
//! fails is rejected on its own; the other instruments still produce rows.

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use super::cost_basis::{ClosedTradeResult, FifoMatcher};
use crate::error::LedgerError;
use crate::models::TradeEvent;

/// An instrument whose stream could not be matched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentFailure {
    pub instrument: String,
    pub error: String,
    #[serde(skip)]
    pub kind: LedgerError,
}

/// Rows from every instrument that matched, plus the ones that did not
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub results: Vec<ClosedTradeResult>,
    pub failures: Vec<InstrumentFailure>,
}

/// Match one instrument's events, which must already be in chronological order.
pub fn match_instrument(events: &[TradeEvent]) -> Result<Vec<ClosedTradeResult>, LedgerError> {
    let Some(first) = events.first() else {
        return Ok(Vec::new());
    };

    validate_ordering(events)?;

    let mut matcher = FifoMatcher::new(first.instrument.clone());
    let mut results = Vec::new();
    for event in events {
        if let Some(result) = matcher.process(event)? {
            results.push(result);
        }
    }
    matcher.finish()?;

    debug!(
        "Matched {} sales for {} ({} lots still open)",
        results.len(),
        first.instrument,
        matcher.book().open_lots().len()
    );

    Ok(results)
}

/// Match a mixed history: sort, group by instrument, isolate failures.
///
/// Instruments are processed in name order so output is deterministic.
/// Rows within an instrument keep chronological order.
pub fn match_events(events: &[TradeEvent]) -> MatchOutcome {
    let mut sorted: Vec<&TradeEvent> = events.iter().collect();
    sorted.sort_by(|a, b| {
        a.instrument
            .cmp(&b.instrument)
            .then_with(|| a.chrono_key().cmp(&b.chrono_key()))
    });

    let mut outcome = MatchOutcome::default();
    let streams = sorted.into_iter().chunk_by(|e| e.instrument.clone());
    for (instrument, group) in &streams {
        let stream: Vec<TradeEvent> = group.cloned().collect();
        match match_instrument(&stream) {
            Ok(results) => outcome.results.extend(results),
            Err(err) => {
                warn!("Skipping {}: {}", instrument, err);
                outcome.failures.push(InstrumentFailure {
                    instrument,
                    error: err.to_string(),
                    kind: err,
                });
            }
        }
    }

    outcome
}

/// Events must share one instrument and be strictly increasing in
/// (date, time, sequence).
fn validate_ordering(events: &[TradeEvent]) -> Result<(), LedgerError> {
    let instrument = &events[0].instrument;
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.instrument != *instrument {
            return Err(LedgerError::MalformedEventOrdering {
                instrument: instrument.clone(),
                detail: format!("stream also contains {}", next.instrument),
            });
        }
        if next.chrono_key() <= prev.chrono_key() {
            return Err(LedgerError::MalformedEventOrdering {
                instrument: instrument.clone(),
                detail: format!(
                    "event #{} at {} {} does not follow event #{} at {} {}",
                    next.sequence, next.date, next.time, prev.sequence, prev.date, prev.time
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Direction};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn trade(instrument: &str, seq: usize, direction: Direction, qty: Decimal, price: Decimal) -> TradeEvent {
        TradeEvent {
            instrument: instrument.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap() + chrono::Days::new(seq as u64),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            activity: Activity::OrdinaryTrade,
            direction,
            quantity: qty,
            price,
            commission: Decimal::ZERO,
            charges: Decimal::ZERO,
            consideration: qty * price,
            sequence: seq,
        }
    }

    #[test]
    fn test_match_events_sorts_reverse_file_order() {
        // Newest first, as the broker exports it
        let events = vec![
            trade("Nio Inc", 2, Direction::Sell, dec!(-5), dec!(40)),
            trade("Nio Inc", 1, Direction::Buy, dec!(5), dec!(30)),
        ];
        let outcome = match_events(&events);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].net_profit, dec!(50));
    }

    #[test]
    fn test_failure_is_isolated_per_instrument() {
        let events = vec![
            trade("Nio Inc", 1, Direction::Buy, dec!(5), dec!(30)),
            trade("Nio Inc", 2, Direction::Sell, dec!(-6), dec!(40)),
            trade("Apple Inc", 3, Direction::Buy, dec!(2), dec!(100)),
            trade("Apple Inc", 4, Direction::Sell, dec!(-2), dec!(110)),
        ];
        let outcome = match_events(&events);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].instrument, "Apple Inc");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].instrument, "Nio Inc");
        assert!(matches!(
            outcome.failures[0].kind,
            LedgerError::InsufficientLots { .. }
        ));
    }

    #[test]
    fn test_match_instrument_rejects_unsorted_stream() {
        let events = vec![
            trade("Nio Inc", 2, Direction::Buy, dec!(5), dec!(30)),
            trade("Nio Inc", 1, Direction::Sell, dec!(-5), dec!(40)),
        ];
        let err = match_instrument(&events).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedEventOrdering { .. }));
    }

    #[test]
    fn test_duplicate_ordering_key_is_malformed() {
        let events = vec![
            trade("Nio Inc", 1, Direction::Buy, dec!(5), dec!(30)),
            trade("Nio Inc", 1, Direction::Buy, dec!(5), dec!(30)),
        ];
        let outcome = match_events(&events);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0].kind,
            LedgerError::MalformedEventOrdering { .. }
        ));
    }

    #[test]
    fn test_match_instrument_rejects_mixed_instruments() {
        let events = vec![
            trade("Nio Inc", 1, Direction::Buy, dec!(5), dec!(30)),
            trade("Apple Inc", 2, Direction::Buy, dec!(5), dec!(30)),
        ];
        assert!(match_instrument(&events).is_err());
    }

    #[test]
    fn test_empty_stream_matches_nothing() {
        assert!(match_instrument(&[]).unwrap().is_empty());
        let outcome = match_events(&[]);
        assert!(outcome.results.is_empty() && outcome.failures.is_empty());
    }
}
