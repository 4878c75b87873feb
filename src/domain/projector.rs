//! Alert projector: a pure projection over the most recent debug-record row
//! per asset. The core replay never emits a STOP LOSS event row — that
//! notion is confined entirely to this module.

use crate::domain::record::DebugRecordRow;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rust_decimal::prelude::Zero;

/// Sentinel target names the projector may emit instead of a level name.
pub const STOP_LOSS: &str = "STOP LOSS";
pub const ALL_FORBIDDEN: &str = "ALL LEVELS FORBIDDEN";

#[derive(Debug, Clone, PartialEq)]
pub struct AlertProjection {
    pub next_buy_target: String,
    pub next_buy_price: Option<Decimal>,
    pub distance_pct: Option<Decimal>,
}

/// `H × 0.19`, the informational stop-loss price.
fn stop_price(row: &DebugRecordRow) -> Option<Decimal> {
    row.h.map(|h| h * dec!(0.19))
}

fn level_price(row: &DebugRecordRow, index: u8) -> Option<Decimal> {
    match index {
        1 => row.b1,
        2 => row.b2,
        3 => row.b3,
        4 => row.b4,
        5 => row.b5,
        6 => row.b6,
        7 => row.b7,
        _ => None,
    }
}

/// Reconstructs the next buy target purely from the allowed-count column —
/// the normative way a consumer that only has the debug CSV (not live
/// `EngineState`) derives target state.
///
/// - `stage = 7` while holding ⇒ STOP LOSS (B7 already the deepest held
///   level; the next meaningful action is the informational stop, not
///   another entry).
/// - `0 < allowed_count < 7` ⇒ target is `B{8 - allowed_count}`.
/// - `allowed_count = 7` ⇒ target is `B1` (no restriction in effect).
/// - `allowed_count = 0` ⇒ every level is forbidden until the next restart.
pub fn project(row: &DebugRecordRow, current_price: Decimal) -> AlertProjection {
    if row.position && row.stage == Some(7) {
        let price = stop_price(row);
        return AlertProjection {
            next_buy_target: STOP_LOSS.to_string(),
            next_buy_price: price,
            distance_pct: distance_pct(current_price, price),
        };
    }

    let allowed = row.forbidden_levels_above_last_sell;
    let (target_name, index) = match allowed {
        0 => (ALL_FORBIDDEN.to_string(), None),
        7 => ("B1".to_string(), Some(1u8)),
        k => {
            let idx = 8 - k;
            (format!("B{idx}"), Some(idx))
        }
    };

    let price = index.and_then(|i| level_price(row, i));
    AlertProjection {
        next_buy_target: target_name,
        next_buy_price: price,
        distance_pct: distance_pct(current_price, price),
    }
}

fn distance_pct(current_price: Decimal, target_price: Option<Decimal>) -> Option<Decimal> {
    let target = target_price?;
    if target.is_zero() {
        return None;
    }
    Some(((current_price - target) / target * dec!(100)).round_dp(6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{DebugRecordRow};
    use chrono::NaiveDate;

    fn base_row() -> DebugRecordRow {
        DebugRecordRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: dec!(100),
            high: dec!(100),
            low: dec!(100),
            close: dec!(100),
            mode: "wait".to_string(),
            position: false,
            stage: None,
            event: String::new(),
            basis: String::new(),
            level_name: String::new(),
            level_price: None,
            trigger_price: None,
            fill_price: None,
            h: Some(dec!(100)),
            l_now: Some(dec!(56)),
            rebound_from_l_pct: None,
            threshold_pct: None,
            forbidden_levels_above_last_sell: 7,
            b1: Some(dec!(56)),
            b2: Some(dec!(52)),
            b3: Some(dec!(46)),
            b4: Some(dec!(41)),
            b5: Some(dec!(35)),
            b6: Some(dec!(28)),
            b7: Some(dec!(21)),
            cutoff_price: None,
            next_buy_level_name: "B1".to_string(),
            next_buy_level_price: Some(dec!(56)),
            next_buy_trigger_price: Some(dec!(56)),
        }
    }

    #[test]
    fn targets_b1_when_no_cutoff_in_effect() {
        let row = base_row();
        let projection = project(&row, dec!(60));
        assert_eq!(projection.next_buy_target, "B1");
        assert_eq!(projection.next_buy_price, Some(dec!(56)));
    }

    #[test]
    fn maps_allowed_count_to_shallowest_blocked_plus_one() {
        let mut row = base_row();
        row.forbidden_levels_above_last_sell = 6; // one level (B1) forbidden
        let projection = project(&row, dec!(50));
        assert_eq!(projection.next_buy_target, "B2");
        assert_eq!(projection.next_buy_price, Some(dec!(52)));
    }

    #[test]
    fn all_forbidden_sentinel_when_allowed_count_zero() {
        let mut row = base_row();
        row.forbidden_levels_above_last_sell = 0;
        let projection = project(&row, dec!(50));
        assert_eq!(projection.next_buy_target, ALL_FORBIDDEN);
        assert_eq!(projection.next_buy_price, None);
    }

    #[test]
    fn stop_loss_sentinel_when_stage_seven_held() {
        let mut row = base_row();
        row.position = true;
        row.stage = Some(7);
        let projection = project(&row, dec!(18));
        assert_eq!(projection.next_buy_target, STOP_LOSS);
        assert_eq!(projection.next_buy_price, Some(dec!(19)));
    }

    #[test]
    fn distance_pct_is_signed_relative_to_target() {
        let row = base_row();
        let projection = project(&row, dec!(56.56));
        // (56.56 - 56) / 56 * 100 = 1.0
        assert_eq!(projection.distance_pct, Some(dec!(1.0)));
    }
}
