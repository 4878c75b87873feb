use rust_decimal::Decimal;
use thiserror::Error;

/// Programmer-contract violations in the cycle/ladder core.
///
/// Everything else (malformed input, empty streams, stale overrides,
/// arithmetic degeneracy) is handled by skipping the affected candle or
/// asset and logging a diagnostic — these are never fatal. This type
/// exists only for the one condition that is truly fatal: a non-positive
/// H supplied externally.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("reference high must be strictly positive, got {h}")]
    NonPositiveHigh { h: Decimal },

    #[error("candle stream for {symbol} is empty")]
    EmptyCandleStream { symbol: String },
}
