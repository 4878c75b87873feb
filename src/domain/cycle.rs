use crate::domain::candle::Candle;
use crate::domain::errors::LadderError;
use crate::domain::levels::{LevelName, LevelSet};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeSet, HashMap};

/// `mode ∈ {high, wait}`. High ratchets toward a new peak; wait tracks the
/// cycle low and runs the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    High,
    Wait,
}

/// The +98.5% rebound-from-low trigger that resets H from the new high.
const RESTART_MULTIPLIER: Decimal = dec!(1.985);

/// The -44% (0.56×H) low-touch that freezes the ladder for the wait phase.
const FREEZE_RATIO: Decimal = dec!(0.56);

/// Per-asset mutable state, evolved candle by candle. Ratchets up in High
/// mode, freezes on a low touch, and restarts on a large rebound from L —
/// every transition must leave `levels`/`forbidden_prices` consistent with
/// `h`/`cutoff_price`.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub mode: Mode,
    h: Option<Decimal>,
    levels: Option<LevelSet>,
    pub l: Option<Decimal>,
    pub position: bool,
    pub stage: Option<u8>,
    pub filled_levels: BTreeSet<LevelName>,
    pub last_fill_date: HashMap<LevelName, NaiveDate>,
    pub cutoff_price: Option<Decimal>,
    pub forbidden_prices: BTreeSet<LevelName>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            mode: Mode::High,
            h: None,
            levels: None,
            l: None,
            position: false,
            stage: None,
            filled_levels: BTreeSet::new(),
            last_fill_date: HashMap::new(),
            cutoff_price: None,
            forbidden_prices: BTreeSet::new(),
        }
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn h(&self) -> Option<Decimal> {
        self.h
    }

    pub fn levels(&self) -> Option<&LevelSet> {
        self.levels.as_ref()
    }

    /// Replace H and recompute the level set. Silently ignored for a
    /// non-positive H — a programmer-contract violation never exercised by
    /// the FSM itself, only reachable via a malformed override, which must
    /// be ignored rather than propagated.
    fn set_h(&mut self, h: Decimal) {
        match LevelSet::compute(h) {
            Ok(levels) => {
                self.h = Some(h);
                self.levels = Some(levels);
                self.recompute_forbidden();
            }
            Err(_) => {
                // Non-positive H from a bad override: skip this H movement
                // for the candle; malformed override entries are silently
                // ignored rather than propagated.
            }
        }
    }

    /// Recomputes `forbidden_prices` from the current level set and
    /// `cutoff_price`. Invoked whenever levels change (override, seed,
    /// ratchet, freeze, restart) so the two redundant representations never
    /// drift apart.
    pub(crate) fn recompute_forbidden(&mut self) {
        self.forbidden_prices.clear();
        if let (Some(levels), Some(cutoff)) = (&self.levels, self.cutoff_price) {
            for (name, price) in levels.entries() {
                if *price > cutoff {
                    self.forbidden_prices.insert(*name);
                }
            }
        }
    }

    /// Number of ladder levels (0..7) currently eligible for entry. 7 when
    /// there is no cutoff in effect.
    pub fn allowed_count(&self) -> u8 {
        let Some(levels) = &self.levels else {
            return 7;
        };
        let Some(cutoff) = self.cutoff_price else {
            return 7;
        };
        let forbidden = LevelName::LADDER
            .iter()
            .filter(|n| levels.price(**n) > cutoff)
            .count() as u8;
        7u8.saturating_sub(forbidden).min(7)
    }

    /// Runs the Cycle FSM (C2) for today's candle: H override, seeding,
    /// ratchet, restart, and freeze transitions, in that order. Returns the
    /// restart trigger price when a restart fires this candle.
    pub fn advance_fsm(&mut self, candle: &Candle, h_override: Option<Decimal>) -> Option<RestartFired> {
        // Step 1: H override takes precedence over all other H movement.
        if let Some(new_h) = h_override {
            if Some(new_h) != self.h {
                self.set_h(new_h);
            }
        }

        // Step 2: H seeding.
        if self.h.is_none() && self.mode == Mode::High {
            self.set_h(candle.high);
        }

        // Step 3: H ratchet in high mode.
        if self.mode == Mode::High {
            if let Some(h) = self.h {
                if candle.high > h {
                    self.set_h(candle.high);
                }
            }
        }

        // Step 4: L tracking in wait.
        if self.mode == Mode::Wait {
            self.l = Some(self.l.map_or(candle.low, |l| l.min(candle.low)));
        }

        let mut restart = None;

        // Step 5: restart transition (wait -> high).
        if self.mode == Mode::Wait {
            if let Some(l) = self.l {
                if candle.high >= RESTART_MULTIPLIER * l {
                    let trigger_price = RESTART_MULTIPLIER * l;
                    self.mode = Mode::High;
                    self.set_h(candle.high);
                    self.l = Some(candle.low);
                    self.cutoff_price = None;
                    self.filled_levels.clear();
                    self.last_fill_date.clear();
                    self.position = false;
                    self.stage = None;
                    self.recompute_forbidden();
                    restart = Some(RestartFired { trigger_price });
                }
            }
        }

        // Step 6: freeze transition (high -> wait), evaluated after restart.
        if self.mode == Mode::High {
            if let Some(h) = self.h {
                if candle.low <= FREEZE_RATIO * h {
                    self.set_h(h); // recompute/freeze levels from current H
                    self.mode = Mode::Wait;
                    self.l = Some(candle.low);
                }
            }
        }

        restart
    }
}

/// Marker returned when the restart transition fires this candle, carrying
/// the trigger price for the RESTART event row.
pub struct RestartFired {
    pub trigger_price: Decimal,
}

#[cfg(test)]
impl EngineState {
    /// Directly seeds mode/H/L for ladder-engine unit tests that do not need
    /// to exercise the FSM transitions themselves.
    pub(crate) fn seed_for_test(h: Decimal, l: Decimal, mode: Mode) -> Self {
        let mut state = Self::new();
        state.h = Some(h);
        state.levels = Some(LevelSet::compute(h).unwrap());
        state.l = Some(l);
        state.mode = mode;
        state
    }
}
