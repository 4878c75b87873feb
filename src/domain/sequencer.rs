//! Event sequencer: orders the rows emitted for one candle.
//!
//! The total order is RESTART (if fired), BUY (at most one), ADDs
//! (shallowest to deepest), SELL (at most one), then exactly one snapshot
//! row — regardless of whether any event fired. This module is the only
//! place that assembles cycle and ladder output into the debug-record row
//! stream; it holds no state of its own.

use crate::domain::candle::Candle;
use crate::domain::cycle::EngineState;
use crate::domain::ladder::advance_ladder;
use crate::domain::record::{DebugRecordRow, RowKind, build_row};
use rust_decimal::Decimal;

/// Advances `state` by one candle and returns the ordered row stream for
/// that day: zero or one RESTART row, zero or one BUY row, zero or more ADD
/// rows, zero or one SELL row, then exactly one snapshot row.
pub fn process_candle(
    state: &mut EngineState,
    candle: &Candle,
    h_override: Option<Decimal>,
) -> Vec<DebugRecordRow> {
    let mut rows = Vec::new();

    let restart = state.advance_fsm(candle, h_override);
    if let Some(restart) = restart {
        rows.push(build_row(
            candle.date,
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            state,
            RowKind::Restart {
                trigger_price: restart.trigger_price,
            },
        ));
    }

    let events = advance_ladder(state, candle);
    for (event, snapshot) in &events {
        rows.push(build_row(
            candle.date,
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            snapshot,
            RowKind::Event(event),
        ));
    }

    rows.push(build_row(
        candle.date,
        candle.open,
        candle.high,
        candle.low,
        candle.close,
        state,
        RowKind::Snapshot,
    ));

    rows
}
