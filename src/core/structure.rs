//! Market structure detection
//!
//! Two deliberately simple, deterministic pieces:
//!
//! - a trailing simple moving average used as the trend filter
//! - fractal swing detection: a candle is a confirmed HIGH only when
//!   every one of the `window` candles on each side failed to exceed it
//!
//! Confirmation therefore lags real time by `window` candles. The first
//! and last `window` candles of a window can never confirm; that is the
//! detector refusing to peek at data it does not have yet, not a bug.

use rust_decimal::Decimal;

use crate::core::series::CandleSeries;
use crate::core::types::{Swing, SwingKind, Trend};

/// Trailing simple moving average over close prices
///
/// Returns `None` with fewer than `period` candles.
pub fn sma(series: &CandleSeries, period: usize) -> Option<Decimal> {
    if period == 0 || series.len() < period {
        return None;
    }

    let start = series.len() - period;
    let mut sum = Decimal::ZERO;
    for i in start..series.len() {
        sum += series.get(i)?.close;
    }
    Some(sum / Decimal::from(period as u64))
}

/// Trend filter: UP if the last close is above the trailing SMA
///
/// Undefined (`None`) until `period` candles exist; callers must treat
/// that as not-yet-tradeable.
pub fn trend_filter(series: &CandleSeries, period: usize) -> Option<Trend> {
    let avg = sma(series, period)?;
    let close = series.last_close()?;

    Some(if close > avg { Trend::Up } else { Trend::Down })
}

/// Identify confirmed fractal highs and lows
///
/// A HIGH at `i` is disqualified by any left high >= the center or any
/// right high > the center; a LOW is the mirror (left low <= center or
/// right low < center). Equal neighbors on the left always disqualify.
/// Output is sorted ascending by index.
pub fn detect_swings(series: &CandleSeries, window: usize) -> Vec<Swing> {
    let mut swings = Vec::new();
    if window == 0 || series.len() < 2 * window + 1 {
        return swings;
    }

    for i in window..series.len() - window {
        let center = match series.get(i) {
            Some(c) => c,
            None => continue,
        };

        let mut is_high = true;
        let mut is_low = true;

        for k in 1..=window {
            let left = match series.get(i - k) {
                Some(c) => c,
                None => continue,
            };
            let right = match series.get(i + k) {
                Some(c) => c,
                None => continue,
            };

            if left.high >= center.high || right.high > center.high {
                is_high = false;
            }
            if left.low <= center.low || right.low < center.low {
                is_low = false;
            }
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            swings.push(Swing {
                index: i,
                price: center.high,
                kind: SwingKind::High,
                time: center.time,
            });
        }
        if is_low {
            swings.push(Swing {
                index: i,
                price: center.low,
                kind: SwingKind::Low,
                time: center.time,
            });
        }
    }

    swings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Candle;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn series_from_closes(closes: &[Decimal]) -> CandleSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    base + Duration::minutes(15 * i as i64),
                    close,
                    close,
                    close,
                    close,
                    dec!(100),
                )
            })
            .collect();
        CandleSeries::from_candles(500, candles)
    }

    /// Build candles with distinct high/low envelopes around the closes
    fn series_from_highs_lows(highs: &[Decimal], lows: &[Decimal]) -> CandleSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = highs
            .iter()
            .zip(lows.iter())
            .enumerate()
            .map(|(i, (&high, &low))| {
                let mid = (high + low) / dec!(2);
                Candle::new(
                    base + Duration::minutes(15 * i as i64),
                    mid,
                    high,
                    low,
                    mid,
                    dec!(100),
                )
            })
            .collect();
        CandleSeries::from_candles(500, candles)
    }

    #[test]
    fn test_sma_basic() {
        let series = series_from_closes(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        // SMA of [3, 4, 5] is 4
        assert_eq!(sma(&series, 3), Some(dec!(4)));
    }

    #[test]
    fn test_sma_insufficient_history() {
        let series = series_from_closes(&[dec!(1), dec!(2)]);
        assert_eq!(sma(&series, 3), None);
        assert_eq!(trend_filter(&series, 3), None);
    }

    #[test]
    fn test_trend_filter_direction() {
        let up = series_from_closes(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        assert_eq!(trend_filter(&up, 3), Some(Trend::Up));

        let down = series_from_closes(&[dec!(5), dec!(4), dec!(3), dec!(2), dec!(1)]);
        assert_eq!(trend_filter(&down, 3), Some(Trend::Down));
    }

    #[test]
    fn test_swing_high_detected() {
        // Highs ramp into index 3 and fall away; lows flat so no LOW confirms
        let highs = [dec!(10), dec!(11), dec!(12), dec!(15), dec!(13), dec!(12), dec!(11)];
        let lows = [dec!(5); 7];
        let series = series_from_highs_lows(&highs, &lows);

        let swings = detect_swings(&series, 2);
        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].kind, SwingKind::High);
        assert_eq!(swings[0].index, 3);
        assert_eq!(swings[0].price, dec!(15));
    }

    #[test]
    fn test_equal_left_high_disqualifies() {
        // Index 3 matches its left neighbor; only index 2 may confirm
        let highs = [dec!(10), dec!(11), dec!(15), dec!(15), dec!(13), dec!(12), dec!(11)];
        let lows = [dec!(5); 7];
        let series = series_from_highs_lows(&highs, &lows);

        let swings = detect_swings(&series, 2);
        assert!(!swings
            .iter()
            .any(|s| s.kind == SwingKind::High && s.index == 3));
        assert!(swings
            .iter()
            .any(|s| s.kind == SwingKind::High && s.index == 2));
    }

    #[test]
    fn test_equal_right_high_allowed() {
        // Right neighbor equal to the center does not disqualify a HIGH
        let highs = [dec!(10), dec!(11), dec!(15), dec!(15), dec!(13), dec!(12), dec!(11)];
        let lows = [dec!(5); 7];
        let series = series_from_highs_lows(&highs, &lows);

        // Window 1: index 2 has left 11 < 15 and right 15 <= 15
        let swings = detect_swings(&series, 1);
        assert!(swings
            .iter()
            .any(|s| s.kind == SwingKind::High && s.index == 2));
        // Index 3 fails: its left neighbor equals it
        assert!(!swings
            .iter()
            .any(|s| s.kind == SwingKind::High && s.index == 3));
    }

    #[test]
    fn test_swing_confirmation_lag() {
        // 20 candles, window 5: no swing may sit in the unconfirmable edges
        let highs: Vec<Decimal> = (0..20).map(|i| dec!(100) + Decimal::from(i % 7)).collect();
        let lows: Vec<Decimal> = highs.iter().map(|h| h - dec!(10)).collect();
        let series = series_from_highs_lows(&highs, &lows);

        let swings = detect_swings(&series, 5);
        for swing in &swings {
            assert!(swing.index >= 5, "swing at {} inside left edge", swing.index);
            assert!(swing.index <= 14, "swing at {} inside right edge", swing.index);
        }
    }

    #[test]
    fn test_swings_sorted_by_index() {
        let highs: Vec<Decimal> = (0..30)
            .map(|i| dec!(100) + Decimal::from((i * 13) % 11))
            .collect();
        let lows: Vec<Decimal> = highs.iter().map(|h| h - dec!(3)).collect();
        let series = series_from_highs_lows(&highs, &lows);

        let swings = detect_swings(&series, 2);
        assert!(swings.windows(2).all(|w| w[0].index <= w[1].index));
    }
}
