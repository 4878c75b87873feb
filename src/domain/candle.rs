use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single daily OHLC candle. Immutable once constructed.
///
/// The core never ingests timestamps below daily granularity; `date` is a
/// calendar day, not a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    pub fn new(date: NaiveDate, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Whether `price` falls within today's `[low, high]` range (inclusive).
    /// This is the "crossed today" test used throughout the ladder engine.
    pub fn crosses(&self, price: Decimal) -> bool {
        self.low <= price && price <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn crosses_is_inclusive_on_both_bounds() {
        let c = Candle::new(date("2024-01-02"), dec!(54), dec!(54), dec!(45), dec!(47));
        assert!(c.crosses(dec!(45)));
        assert!(c.crosses(dec!(54)));
        assert!(c.crosses(dec!(50)));
        assert!(!c.crosses(dec!(44.99)));
        assert!(!c.crosses(dec!(54.01)));
    }
}
