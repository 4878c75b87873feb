use crate::domain::candle::Candle;
use crate::domain::cycle::{EngineState, Mode};
use crate::domain::levels::LevelName;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// L-relative rebound percentage required to SELL at each stage (1..7).
pub(crate) fn sell_threshold_pct(stage: u8) -> Decimal {
    match stage {
        1 => dec!(7.7),
        2 => dec!(17.3),
        3 => dec!(24.4),
        4 => dec!(37.4),
        5 => dec!(52.7),
        6 => dec!(79.9),
        7 => dec!(98.5),
        _ => unreachable!("stage is always in 1..=7 while a position is held"),
    }
}

/// A single BUY, ADD, or SELL fill produced by the ladder engine for today's
/// candle. RESTART rows come from the cycle FSM, not from here.
#[derive(Debug, Clone, PartialEq)]
pub enum LadderEvent {
    Buy {
        level: LevelName,
        price: Decimal,
        trigger_price: Decimal,
    },
    Add {
        level: LevelName,
        price: Decimal,
        trigger_price: Decimal,
    },
    Sell {
        stage: u8,
        target_price: Decimal,
        fill_price: Decimal,
        trigger_price: Decimal,
    },
}

/// Whether `n`'s price is a legal entry today: crossed, not forbidden, and
/// (when a cutoff is in effect) at or below it.
fn is_allowed_candidate(state: &EngineState, candle: &Candle, n: LevelName, price: Decimal) -> bool {
    candle.crosses(price)
        && !state.forbidden_prices.contains(&n)
        && state.cutoff_price.is_none_or(|cutoff| price <= cutoff)
}

/// Runs BUY, then ADD, then SELL for today's candle (C3), assuming the
/// Cycle FSM (C2) has already updated `state.mode` for today. Returns the
/// fired events in emission order (BUY, ADDs shallow-to-deep, SELL), each
/// paired with a snapshot of `state` taken immediately after that event's
/// own mutation — the Event Sequencer (C4) flushes one record row per
/// snapshot rather than inlining state mutations into writes (design note
/// §9).
pub fn advance_ladder(state: &mut EngineState, candle: &Candle) -> Vec<(LadderEvent, EngineState)> {
    let mut events = Vec::new();

    if state.mode != Mode::Wait {
        return events;
    }

    let Some(levels) = state.levels().cloned() else {
        return events;
    };

    if !state.position {
        if let Some((level, price)) = levels
            .ladder_entries()
            .filter(|(n, p)| is_allowed_candidate(state, candle, *n, *p))
            .max_by_key(|(_, p)| *p)
        {
            state.position = true;
            state.stage = level.ladder_index();
            state.filled_levels.insert(level);
            state.last_fill_date.insert(level, candle.date);
            state.l = Some(candle.low);
            events.push((
                LadderEvent::Buy {
                    level,
                    price,
                    trigger_price: candle.low,
                },
                state.clone(),
            ));
        }
    }

    if state.position {
        let deepest = state.stage.unwrap_or(0);
        let mut candidates: Vec<(LevelName, Decimal)> = levels
            .ladder_entries()
            .filter(|(n, p)| {
                is_allowed_candidate(state, candle, *n, *p)
                    && state.last_fill_date.get(n) != Some(&candle.date)
                    && !state.filled_levels.contains(n)
                    && n.ladder_index().unwrap() > deepest
            })
            .collect();
        candidates.sort_by_key(|(n, _)| n.ladder_index());

        for (level, price) in candidates {
            state.filled_levels.insert(level);
            state.last_fill_date.insert(level, candle.date);
            state.stage = Some(state.stage.map_or(level.ladder_index().unwrap(), |s| {
                s.max(level.ladder_index().unwrap())
            }));
            state.l = Some(state.l.map_or(candle.low, |l| l.min(candle.low)));
            events.push((
                LadderEvent::Add {
                    level,
                    price,
                    trigger_price: candle.low,
                },
                state.clone(),
            ));
        }
    }

    if state.position {
        state.l = Some(state.l.map_or(candle.low, |l| l.min(candle.low)));
        let l = state.l.expect("L is set whenever a position is held");
        let stage = state.stage.expect("stage is set whenever a position is held");

        if l > Decimal::ZERO {
            let rebound_pct = (candle.high / l - Decimal::ONE) * dec!(100);
            let threshold = sell_threshold_pct(stage);

            if rebound_pct >= threshold {
                let target = l * (Decimal::ONE + threshold / dec!(100));
                let fill_price = if candle.low >= target { candle.open } else { target };
                let cutoff = target.max(fill_price);

                state.cutoff_price = Some(cutoff);
                state.position = false;
                state.stage = None;
                state.filled_levels.clear();
                state.last_fill_date.clear();
                state.recompute_forbidden();

                events.push((
                    LadderEvent::Sell {
                        stage,
                        target_price: target,
                        fill_price,
                        trigger_price: candle.high,
                    },
                    state.clone(),
                ));
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn scenario_a_cold_start_buy_then_sell() {
        // Day2 seeds H=100; Day3 freezes (low=56 <= 0.56*100) and also
        // crosses B1=56, so the FSM and the BUY run on the same candle.
        // Day3's own high is held at 56 (no rebound yet) so the SELL check
        // does not also fire same-day; property 8's single-candle
        // round-trip is covered separately below.
        let mut state = EngineState::new();
        state.advance_fsm(&Candle::new(date("2024-01-02"), dec!(100), dec!(100), dec!(100), dec!(100)), None);
        state.advance_fsm(&Candle::new(date("2024-01-03"), dec!(56), dec!(56), dec!(56), dec!(56)), None);
        let buy_events = advance_ladder(&mut state, &Candle::new(date("2024-01-03"), dec!(56), dec!(56), dec!(56), dec!(56)));
        assert_eq!(
            buy_events.iter().map(|(e, _)| e.clone()).collect::<Vec<_>>(),
            vec![LadderEvent::Buy {
                level: LevelName::B1,
                price: dec!(56),
                trigger_price: dec!(56),
            }]
        );
        assert_eq!(state.stage, Some(1));

        let day4 = Candle::new(date("2024-01-04"), dec!(56), dec!(100), dec!(56), dec!(100));
        state.advance_fsm(&day4, None);
        let sell_events = advance_ladder(&mut state, &day4);
        assert_eq!(sell_events.len(), 1);
        match &sell_events[0].0 {
            LadderEvent::Sell {
                stage,
                target_price,
                fill_price,
                ..
            } => {
                assert_eq!(*stage, 1);
                assert_eq!(*target_price, dec!(56) * dec!(1.077));
                assert_eq!(*fill_price, dec!(56) * dec!(1.077));
            }
            other => panic!("expected Sell, got {other:?}"),
        }
        assert_eq!(state.cutoff_price, Some(dec!(56) * dec!(1.077)));
        // cutoff (60.312) sits above every B-level derived from the frozen
        // H=100 table (B1=56 is the highest), so none are forbidden yet —
        // see DESIGN.md's note on the worked Scenario A allowed-count figure.
        assert_eq!(state.allowed_count(), 7);
    }

    #[test]
    fn scenario_c_same_candle_buy_then_deeper_add() {
        let mut state = EngineState::seed_for_test(dec!(100), dec!(80), Mode::Wait);
        let events = advance_ladder(
            &mut state,
            &Candle::new(date("2024-01-03"), dec!(54), dec!(54), dec!(45), dec!(47)),
        );
        assert_eq!(
            events.iter().map(|(e, _)| e.clone()).collect::<Vec<_>>(),
            vec![
                LadderEvent::Buy {
                    level: LevelName::B2,
                    price: dec!(52),
                    trigger_price: dec!(45),
                },
                LadderEvent::Add {
                    level: LevelName::B3,
                    price: dec!(46),
                    trigger_price: dec!(45),
                },
            ]
        );
        assert_eq!(state.stage, Some(3));
        assert!(state.filled_levels.contains(&LevelName::B2));
        assert!(state.filled_levels.contains(&LevelName::B3));
    }

    #[test]
    fn scenario_d_gap_open_sell_fills_at_open() {
        let mut state = EngineState::seed_for_test(dec!(100), dec!(80), Mode::Wait);
        state.position = true;
        state.stage = Some(2);
        state.l = Some(dec!(50));
        state.filled_levels.insert(LevelName::B1);
        state.filled_levels.insert(LevelName::B2);

        let events = advance_ladder(
            &mut state,
            &Candle::new(date("2024-01-04"), dec!(62), dec!(64), dec!(60), dec!(63)),
        );
        match &events[0].0 {
            LadderEvent::Sell {
                target_price,
                fill_price,
                ..
            } => {
                assert_eq!(*target_price, dec!(50) * dec!(1.173));
                assert_eq!(*fill_price, dec!(62));
            }
            other => panic!("expected Sell, got {other:?}"),
        }
        assert_eq!(state.cutoff_price, Some(dec!(62)));
    }
}
