use crate::domain::errors::LadderError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier for one of the eight proportional price levels. Names
/// are stable; only the price attached to a name changes as H moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelName {
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    Stop,
}

impl LevelName {
    /// Ratio applied to H to derive this level's price.
    fn ratio(&self) -> Decimal {
        match self {
            LevelName::B1 => dec!(0.56),
            LevelName::B2 => dec!(0.52),
            LevelName::B3 => dec!(0.46),
            LevelName::B4 => dec!(0.41),
            LevelName::B5 => dec!(0.35),
            LevelName::B6 => dec!(0.28),
            LevelName::B7 => dec!(0.21),
            LevelName::Stop => dec!(0.19),
        }
    }

    /// The ladder index (1..7) governing stage/sell-threshold lookups.
    /// `Stop` has no ladder index: it is never a BUY/ADD candidate.
    pub fn ladder_index(&self) -> Option<u8> {
        match self {
            LevelName::B1 => Some(1),
            LevelName::B2 => Some(2),
            LevelName::B3 => Some(3),
            LevelName::B4 => Some(4),
            LevelName::B5 => Some(5),
            LevelName::B6 => Some(6),
            LevelName::B7 => Some(7),
            LevelName::Stop => None,
        }
    }

    /// Inverse of `ladder_index`: maps 1..7 back to a level name.
    pub fn from_ladder_index(index: u8) -> Option<LevelName> {
        match index {
            1 => Some(LevelName::B1),
            2 => Some(LevelName::B2),
            3 => Some(LevelName::B3),
            4 => Some(LevelName::B4),
            5 => Some(LevelName::B5),
            6 => Some(LevelName::B6),
            7 => Some(LevelName::B7),
            _ => None,
        }
    }

    /// All buy/add ladder levels, shallowest (B1) first.
    pub const LADDER: [LevelName; 7] = [
        LevelName::B1,
        LevelName::B2,
        LevelName::B3,
        LevelName::B4,
        LevelName::B5,
        LevelName::B6,
        LevelName::B7,
    ];
}

impl fmt::Display for LevelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelName::B1 => write!(f, "B1"),
            LevelName::B2 => write!(f, "B2"),
            LevelName::B3 => write!(f, "B3"),
            LevelName::B4 => write!(f, "B4"),
            LevelName::B5 => write!(f, "B5"),
            LevelName::B6 => write!(f, "B6"),
            LevelName::B7 => write!(f, "B7"),
            LevelName::Stop => write!(f, "Stop"),
        }
    }
}

/// The eight proportional price levels derived from a reference high H,
/// stored at full precision (rounding only happens at record-emission time).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet {
    h: Decimal,
    /// Ascending by price: Stop, B7, B6, ..., B1.
    entries: Vec<(LevelName, Decimal)>,
}

impl LevelSet {
    /// Pure function `H ↦ {B1..B7, Stop}`. Fails only if H is non-positive;
    /// the FSM guarantees H > 0 before this is ever called.
    pub fn compute(h: Decimal) -> Result<Self, LadderError> {
        if h <= Decimal::ZERO {
            return Err(LadderError::NonPositiveHigh { h });
        }

        let mut entries: Vec<(LevelName, Decimal)> = [
            LevelName::B1,
            LevelName::B2,
            LevelName::B3,
            LevelName::B4,
            LevelName::B5,
            LevelName::B6,
            LevelName::B7,
            LevelName::Stop,
        ]
        .into_iter()
        .map(|name| (name, h * name.ratio()))
        .collect();

        entries.sort_by(|a, b| a.1.cmp(&b.1));

        Ok(Self { h, entries })
    }

    pub fn h(&self) -> Decimal {
        self.h
    }

    pub fn price(&self, name: LevelName) -> Decimal {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
            .expect("LevelSet always carries all eight level names")
    }

    /// All eight (name, price) pairs, ascending by price.
    pub fn entries(&self) -> &[(LevelName, Decimal)] {
        &self.entries
    }

    /// The seven buy/add ladder levels, shallowest (B1) first.
    pub fn ladder_entries(&self) -> impl Iterator<Item = (LevelName, Decimal)> + '_ {
        LevelName::LADDER.iter().map(|n| (*n, self.price(*n)))
    }
}
