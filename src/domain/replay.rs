//! Per-asset replay: the pure fold over one asset's candle sequence. There
//! are no suspension points inside the core; fanning this out across many
//! assets in parallel is an application-layer concern (`application::replay`).
//! This module has no I/O and no await points.

use crate::domain::candle::Candle;
use crate::domain::cycle::EngineState;
use crate::domain::errors::LadderError;
use crate::domain::record::DebugRecordRow;
use crate::domain::sequencer::process_candle;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Replays one asset's candle stream into the ordered debug-record row
/// stream. The first candle is always discarded — a listing-day
/// data-quality accommodation, not a semantic feature. Returns
/// `EmptyCandleStream` only when the raw input itself has no candles; a
/// single-candle stream (nothing left after the discard) yields an empty,
/// but not erroneous, row stream.
pub fn replay_asset(
    symbol: &str,
    candles: &[Candle],
    h_overrides: Option<&HashMap<NaiveDate, Decimal>>,
) -> Result<Vec<DebugRecordRow>, LadderError> {
    if candles.is_empty() {
        return Err(LadderError::EmptyCandleStream {
            symbol: symbol.to_string(),
        });
    }

    let mut state = EngineState::new();
    let mut rows = Vec::new();

    for candle in &candles[1..] {
        let h_override = h_overrides.and_then(|map| map.get(&candle.date)).copied();
        rows.extend(process_candle(&mut state, candle, h_override));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_stream_is_an_error() {
        let result = replay_asset("BTC", &[], None);
        assert!(matches!(result, Err(LadderError::EmptyCandleStream { .. })));
    }

    #[test]
    fn single_candle_after_discard_yields_no_rows() {
        let candles = vec![Candle::new(date("2024-01-01"), dec!(1), dec!(1), dec!(1), dec!(1))];
        let rows = replay_asset("BTC", &candles, None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn scenario_a_full_round_trip_via_replay() {
        // Day1 discarded; Day2 seeds H; Day3 freezes+BUYs; Day4 SELLs.
        let candles = vec![
            Candle::new(date("2024-01-01"), dec!(1), dec!(1), dec!(1), dec!(1)),
            Candle::new(date("2024-01-02"), dec!(100), dec!(100), dec!(100), dec!(100)),
            Candle::new(date("2024-01-03"), dec!(100), dec!(100), dec!(56), dec!(56)),
            Candle::new(date("2024-01-04"), dec!(56), dec!(100), dec!(56), dec!(100)),
        ];
        let rows = replay_asset("BTC", &candles, None).unwrap();

        let buy_row = rows.iter().find(|r| r.event.starts_with("BUY")).unwrap();
        assert_eq!(buy_row.event, "BUY B1");
        assert_eq!(buy_row.level_price, Some(dec!(56.0000000000)));

        let sell_row = rows.iter().find(|r| r.event.starts_with("SELL")).unwrap();
        assert_eq!(sell_row.event, "SELL S1");
        assert_eq!(sell_row.fill_price, Some(dec!(60.31200000)));
        assert_eq!(sell_row.cutoff_price, Some(dec!(60.31200000)));

        let last_snapshot = rows.last().unwrap();
        // cutoff (60.312) is above every B-level at H=100, so nothing is
        // forbidden yet (see DESIGN.md's note on the worked Scenario A figure).
        assert_eq!(last_snapshot.forbidden_levels_above_last_sell, 7);
    }

    #[test]
    fn h_override_replaces_ratchet_for_the_day() {
        let candles = vec![
            Candle::new(date("2024-01-01"), dec!(1), dec!(1), dec!(1), dec!(1)),
            Candle::new(date("2024-01-02"), dec!(100), dec!(100), dec!(100), dec!(100)),
            Candle::new(date("2024-01-03"), dec!(100), dec!(105), dec!(100), dec!(100)),
        ];
        let mut overrides = HashMap::new();
        overrides.insert(date("2024-01-03"), dec!(200));

        let rows = replay_asset("BTC", &candles, Some(&overrides)).unwrap();
        let snapshot = rows.last().unwrap();
        assert_eq!(snapshot.h, Some(dec!(200)));
    }
}
