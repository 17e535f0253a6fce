//! Entry-signal strategy
//!
//! Combines three filters before risking anything:
//!
//! 1. Trend: close above/below the trailing SMA
//! 2. Structure: the last two confirmed swings must form a completed
//!    impulse in the trend direction, with Dow-theory continuation
//!    (higher high in an uptrend, lower low in a downtrend)
//! 3. Price: the current close must sit inside the golden zone, the
//!    retracement band between the 0.5 and 0.618 levels
//!
//! Every falling-through branch means "no signal", never an error. The
//! evaluation is pure over the candle window: the same window always
//! yields the same answer.

use rust_decimal::Decimal;

use crate::core::fib;
use crate::core::series::CandleSeries;
use crate::core::structure::{detect_swings, trend_filter};
use crate::core::types::{Direction, Swing, SwingKind, TradeSignal, Trend};

/// Strategy parameters, fixed at construction
#[derive(Debug, Clone)]
pub struct Strategy {
    sma_period: usize,
    swing_window: usize,
}

impl Strategy {
    pub fn new(sma_period: usize, swing_window: usize) -> Self {
        Self { sma_period, swing_window }
    }

    /// Evaluate the window for an entry signal
    ///
    /// Returns at most one signal per evaluation.
    pub fn check_signal(&self, series: &CandleSeries) -> Option<TradeSignal> {
        if series.len() < self.sma_period + 10 {
            return None;
        }

        let trend = trend_filter(series, self.sma_period)?;
        let current_price = series.last_close()?;

        let swings = detect_swings(series, self.swing_window);
        if swings.len() < 4 {
            return None;
        }

        // The most recent confirmed swing happened swing_window bars ago;
        // price has been retracing from it since.
        let last = &swings[swings.len() - 1];
        let prev = &swings[swings.len() - 2];

        match trend {
            Trend::Up => self.check_long(&swings, last, prev, current_price),
            Trend::Down => self.check_short(&swings, last, prev, current_price),
        }
    }

    /// Uptrend: impulse Low -> High completed, price pulling back
    fn check_long(
        &self,
        swings: &[Swing],
        last: &Swing,
        prev: &Swing,
        current_price: Decimal,
    ) -> Option<TradeSignal> {
        if last.kind != SwingKind::High || prev.kind != SwingKind::Low {
            return None;
        }

        // Dow theory: this high must exceed the prior high, otherwise
        // we are looking at consolidation or a reversal.
        let prior_high = swings[..swings.len() - 2]
            .iter()
            .rev()
            .find(|s| s.kind == SwingKind::High);
        if let Some(prior) = prior_high {
            if last.price <= prior.price {
                return None;
            }
        }

        let levels = fib::levels(prev.price, last.price, Trend::Up);

        // Golden zone: 0.618 sits below 0.5 when retracing down
        let upper = levels.level_500;
        let lower = levels.level_618;

        if lower <= current_price && current_price <= upper {
            return Some(TradeSignal {
                direction: Direction::Buy,
                entry_price: current_price,
                stop_loss: prev.price,
                take_profit_1: levels.ext_1000,
                take_profit_2: levels.ext_1618,
                reason: format!("Uptrend pullback to golden zone ({lower:.4}-{upper:.4})"),
            });
        }

        None
    }

    /// Downtrend mirror: impulse High -> Low completed, price bouncing up
    fn check_short(
        &self,
        swings: &[Swing],
        last: &Swing,
        prev: &Swing,
        current_price: Decimal,
    ) -> Option<TradeSignal> {
        if last.kind != SwingKind::Low || prev.kind != SwingKind::High {
            return None;
        }

        let prior_low = swings[..swings.len() - 2]
            .iter()
            .rev()
            .find(|s| s.kind == SwingKind::Low);
        if let Some(prior) = prior_low {
            if last.price >= prior.price {
                return None;
            }
        }

        let levels = fib::levels(prev.price, last.price, Trend::Down);

        // Mirrored zone: 0.618 sits above 0.5 when retracing up
        let lower = levels.level_500;
        let upper = levels.level_618;

        if lower <= current_price && current_price <= upper {
            return Some(TradeSignal {
                direction: Direction::Sell,
                entry_price: current_price,
                stop_loss: prev.price,
                take_profit_1: levels.ext_1000,
                take_profit_2: levels.ext_1618,
                reason: format!("Downtrend pullback to golden zone ({lower:.4}-{upper:.4})"),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Candle;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn series_from_bars(bars: &[(Decimal, Decimal, Decimal)]) -> CandleSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = bars
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                Candle::new(
                    base + Duration::minutes(15 * i as i64),
                    close,
                    high,
                    low,
                    close,
                    dec!(100),
                )
            })
            .collect();
        CandleSeries::from_candles(500, candles)
    }

    fn ramp(bars: &mut Vec<(Decimal, Decimal, Decimal)>, from: i64, to: i64, steps: i64) {
        for s in 1..=steps {
            let px = Decimal::from(from) + Decimal::from((to - from) * s) / Decimal::from(steps);
            bars.push((px + dec!(1), px - dec!(1), px));
        }
    }

    /// Synthetic uptrend with a higher-low / higher-high pair and the
    /// final close retraced into the golden zone of the last impulse.
    ///
    /// Confirmed swings (window 2):
    ///   HIGH 110 @ 13, LOW 100 @ 19, HIGH 120 @ 25, LOW 104 @ 31,
    ///   HIGH 124 @ 37, then a pullback closing at 113 inside the
    ///   [111.64, 114] zone of the 104 -> 124 impulse.
    fn uptrend_bars() -> Vec<(Decimal, Decimal, Decimal)> {
        let mut bars = vec![(dec!(106), dec!(104), dec!(105)); 10]; // flat base, 0..=9
        ramp(&mut bars, 105, 108, 3); // 10..=12
        bars.push((dec!(110), dec!(108), dec!(109))); // HIGH 110 @ 13
        ramp(&mut bars, 108, 103, 5); // 14..=18
        bars.push((dec!(103), dec!(100), dec!(102))); // LOW 100 @ 19
        ramp(&mut bars, 103, 118, 5); // 20..=24
        bars.push((dec!(120), dec!(117), dec!(119))); // HIGH 120 @ 25
        ramp(&mut bars, 117, 107, 5); // 26..=30
        bars.push((dec!(107), dec!(104), dec!(106))); // LOW 104 @ 31
        ramp(&mut bars, 107, 122, 5); // 32..=36
        bars.push((dec!(124), dec!(121), dec!(123))); // HIGH 124 @ 37
        ramp(&mut bars, 121, 113, 4); // pullback, 38..=41
        bars.push((dec!(114), dec!(112), dec!(113))); // close in the zone
        bars
    }

    #[test]
    fn test_insufficient_history_no_signal() {
        let bars = vec![(dec!(101), dec!(99), dec!(100)); 12];
        let series = series_from_bars(&bars);
        let strategy = Strategy::new(5, 2);

        // 12 candles < period + 10
        assert_eq!(strategy.check_signal(&series), None);
    }

    #[test]
    fn test_uptrend_pullback_yields_buy() {
        let series = series_from_bars(&uptrend_bars());
        let strategy = Strategy::new(30, 2);

        let signal = strategy
            .check_signal(&series)
            .expect("expected a BUY signal");

        assert_eq!(signal.direction, Direction::Buy);
        // Stop at the previous swing low
        assert_eq!(signal.stop_loss, dec!(104));
        // Targets extend 100% / 161.8% of the 20-point impulse above 124
        assert_eq!(signal.take_profit_1, dec!(144));
        assert_eq!(signal.take_profit_2, dec!(156.36));
        assert_eq!(signal.entry_price, dec!(113));
    }

    #[test]
    fn test_downtrend_pullback_yields_sell() {
        // Mirror of the uptrend fixture around 200
        let bars: Vec<(Decimal, Decimal, Decimal)> = uptrend_bars()
            .into_iter()
            .map(|(high, low, close)| (dec!(200) - low, dec!(200) - high, dec!(200) - close))
            .collect();
        let series = series_from_bars(&bars);
        let strategy = Strategy::new(30, 2);

        let signal = strategy
            .check_signal(&series)
            .expect("expected a SELL signal");

        assert_eq!(signal.direction, Direction::Sell);
        assert_eq!(signal.stop_loss, dec!(96));
        assert_eq!(signal.take_profit_1, dec!(56));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let series = series_from_bars(&uptrend_bars());
        let strategy = Strategy::new(30, 2);

        let first = strategy.check_signal(&series);
        let second = strategy.check_signal(&series);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_lower_high_rejected() {
        // Final impulse tops at 118, below the prior confirmed high at
        // 120: no higher high, no entry even from inside the zone.
        let mut bars = uptrend_bars();
        bars.truncate(32); // keep through LOW 104 @ 31
        ramp(&mut bars, 107, 115, 5); // 32..=36
        bars.push((dec!(118), dec!(115), dec!(117))); // lower HIGH @ 37
        ramp(&mut bars, 115, 110, 4); // 38..=41
        bars.push((dec!(112), dec!(110), dec!(111))); // in-zone close, trend still up
        let series = series_from_bars(&bars);
        let strategy = Strategy::new(30, 2);

        assert_eq!(strategy.check_signal(&series), None);
    }

    #[test]
    fn test_close_outside_zone_rejected() {
        // Same structure, but the final close sits above the 0.5 level
        let mut bars = uptrend_bars();
        bars.pop();
        bars.push((dec!(117), dec!(115), dec!(116)));
        let series = series_from_bars(&bars);
        let strategy = Strategy::new(30, 2);

        assert_eq!(strategy.check_signal(&series), None);
    }
}
