//! Debug record writer: the fixed, external-contract row schema that a
//! spreadsheet summarizer, a universe selector, and a realtime monitor all
//! contract against. Serialization is a trivial projection over
//! `EngineState` + the day's events — keep state mutation in
//! `cycle`/`ladder`, keep this a pure formatting layer.

use crate::domain::cycle::EngineState;
use crate::domain::ladder::LadderEvent;
use crate::domain::levels::LevelName;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::Zero;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// `basis` column: which side of the candle range triggered the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    Low,
    High,
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Basis::Low => write!(f, "LOW"),
            Basis::High => write!(f, "HIGH"),
        }
    }
}

/// One row of the debug record CSV: either an event row (BUY/ADD/SELL/
/// RESTART) or the one mandatory end-of-day snapshot row. Column order and
/// names are normative — downstream consumers parse by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugRecordRow {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub mode: String,
    pub position: bool,
    pub stage: Option<u8>,
    pub event: String,
    pub basis: String,
    pub level_name: String,
    pub level_price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub fill_price: Option<Decimal>,
    pub h: Option<Decimal>,
    pub l_now: Option<Decimal>,
    pub rebound_from_l_pct: Option<Decimal>,
    pub threshold_pct: Option<Decimal>,
    pub forbidden_levels_above_last_sell: u8,
    pub b1: Option<Decimal>,
    pub b2: Option<Decimal>,
    pub b3: Option<Decimal>,
    pub b4: Option<Decimal>,
    pub b5: Option<Decimal>,
    pub b6: Option<Decimal>,
    pub b7: Option<Decimal>,
    pub cutoff_price: Option<Decimal>,
    pub next_buy_level_name: String,
    pub next_buy_level_price: Option<Decimal>,
    pub next_buy_trigger_price: Option<Decimal>,
}

/// Rounding precision for price-like fields vs level prices vs percentages:
/// 8 / 10 / 6 decimals respectively.
fn round_price(d: Decimal) -> Decimal {
    d.round_dp(8)
}

fn round_level_price(d: Decimal) -> Decimal {
    d.round_dp(10)
}

fn round_pct(d: Decimal) -> Decimal {
    d.round_dp(6)
}

/// What produced this row: an event (with its level/price detail) or the
/// bare end-of-day snapshot.
pub enum RowKind<'a> {
    Restart { trigger_price: Decimal },
    Event(&'a LadderEvent),
    Snapshot,
}

/// Builds one `DebugRecordRow` from the candle, the post-advance state, and
/// what fired. `rebound_from_l_pct`/`threshold_pct` are only meaningful on
/// SELL rows and the snapshot row while holding a position; `None` when L or
/// H is zero/absent — arithmetic degeneracy omits the percentage rather
/// than propagating a division by zero.
pub fn build_row(
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    state: &EngineState,
    kind: RowKind<'_>,
) -> DebugRecordRow {
    let levels = state.levels();
    let b_price = |name: LevelName| levels.map(|l| round_level_price(l.price(name)));

    let (event, basis, level_name, level_price, trigger_price, fill_price) = match kind {
        RowKind::Restart { trigger_price } => (
            "RESTART_+98.5pct".to_string(),
            Basis::High.to_string(),
            String::new(),
            None,
            Some(round_price(trigger_price)),
            None,
        ),
        RowKind::Event(LadderEvent::Buy {
            level,
            price,
            trigger_price,
        }) => (
            format!("BUY {level}"),
            Basis::Low.to_string(),
            level.to_string(),
            Some(round_level_price(*price)),
            Some(round_price(*trigger_price)),
            Some(round_price(*price)),
        ),
        RowKind::Event(LadderEvent::Add {
            level,
            price,
            trigger_price,
        }) => (
            format!("ADD {level}"),
            Basis::Low.to_string(),
            level.to_string(),
            Some(round_level_price(*price)),
            Some(round_price(*trigger_price)),
            Some(round_price(*price)),
        ),
        RowKind::Event(LadderEvent::Sell {
            stage,
            target_price: _,
            fill_price,
            trigger_price,
        }) => (
            format!("SELL S{stage}"),
            Basis::High.to_string(),
            String::new(),
            None,
            Some(round_price(*trigger_price)),
            Some(round_price(*fill_price)),
        ),
        RowKind::Snapshot => (String::new(), String::new(), String::new(), None, None, None),
    };

    let rebound_from_l_pct = state.l.and_then(|l| {
        if l.is_zero() {
            None
        } else {
            Some(round_pct((high / l - Decimal::ONE) * dec!(100)))
        }
    });
    let threshold_pct = state
        .stage
        .map(|stage| round_pct(crate::domain::ladder::sell_threshold_pct(stage)));

    let next_buy = next_buy_candidate(state);

    DebugRecordRow {
        date,
        open: round_price(open),
        high: round_price(high),
        low: round_price(low),
        close: round_price(close),
        mode: match state.mode {
            crate::domain::cycle::Mode::High => "high".to_string(),
            crate::domain::cycle::Mode::Wait => "wait".to_string(),
        },
        position: state.position,
        stage: state.stage,
        event,
        basis,
        level_name,
        level_price,
        trigger_price,
        fill_price,
        h: state.h().map(round_price),
        l_now: state.l.map(round_price),
        rebound_from_l_pct,
        threshold_pct,
        forbidden_levels_above_last_sell: state.allowed_count(),
        b1: b_price(LevelName::B1),
        b2: b_price(LevelName::B2),
        b3: b_price(LevelName::B3),
        b4: b_price(LevelName::B4),
        b5: b_price(LevelName::B5),
        b6: b_price(LevelName::B6),
        b7: b_price(LevelName::B7),
        cutoff_price: state.cutoff_price.map(round_price),
        next_buy_level_name: next_buy
            .map(|(n, _)| n.to_string())
            .unwrap_or_default(),
        next_buy_level_price: next_buy.map(|(_, p)| round_level_price(p)),
        next_buy_trigger_price: next_buy.map(|(_, p)| round_price(p)),
    }
}

/// Shallowest not-yet-filled, non-forbidden level at or below the cutoff —
/// used to populate `next_buy_level_name`/`next_buy_level_price` on the
/// snapshot row. This is a convenience projection of the *current* state; the
/// full post-sell reconstruction rule (from the allowed-count column alone)
/// lives in `projector` for consumers that only have the CSV, not live state.
fn next_buy_candidate(state: &EngineState) -> Option<(LevelName, Decimal)> {
    let levels = state.levels()?;
    if state.mode != crate::domain::cycle::Mode::Wait {
        return None;
    }
    levels
        .ladder_entries()
        .filter(|(n, p)| {
            !state.filled_levels.contains(n)
                && !state.forbidden_prices.contains(n)
                && state.cutoff_price.is_none_or(|c| *p <= c)
        })
        .max_by_key(|(_, p)| *p)
}
