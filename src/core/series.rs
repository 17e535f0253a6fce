//! Rolling candle window
//!
//! A bounded per-symbol view of recent price history. Appending past
//! capacity drops the oldest candle, so the window never reallocates
//! into an unbounded table.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::core::types::Candle;

/// Fixed-capacity, time-ordered candle window
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleSeries {
    /// Create an empty window holding at most `capacity` candles
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a window from candles already in time order
    pub fn from_candles(capacity: usize, candles: Vec<Candle>) -> Self {
        let mut series = Self::new(capacity);
        for candle in candles {
            series.push(candle);
        }
        series
    }

    /// Append a candle, dropping the oldest once at capacity
    pub fn push(&mut self, candle: Candle) {
        if self.candles.len() == self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Candle at window index `i` (0 = oldest retained)
    pub fn get(&self, i: usize) -> Option<&Candle> {
        self.candles.get(i)
    }

    /// Most recent candle
    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Close price of the most recent candle
    pub fn last_close(&self) -> Option<Decimal> {
        self.candles.back().map(|c| c.close)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    /// Close prices in window order
    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn candle(i: i64, close: Decimal) -> Candle {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::minutes(15 * i);
        Candle::new(time, close, close, close, close, dec!(100))
    }

    #[test]
    fn test_push_drops_oldest_at_capacity() {
        let mut series = CandleSeries::new(3);
        for i in 0..5 {
            series.push(candle(i, Decimal::from(i)));
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.get(0).unwrap().close, dec!(2));
        assert_eq!(series.last_close(), Some(dec!(4)));
    }

    #[test]
    fn test_order_preserved() {
        let candles: Vec<Candle> = (0..4).map(|i| candle(i, Decimal::from(i))).collect();
        let series = CandleSeries::from_candles(10, candles);

        let closes = series.closes();
        assert_eq!(closes, vec![dec!(0), dec!(1), dec!(2), dec!(3)]);
    }
}
