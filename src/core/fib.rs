//! Fibonacci retracement and extension levels
//!
//! Pure pricing model over one ordered swing pair: `p1` anchors the
//! start of the impulse (the low in an uptrend), `p2` its end. All
//! levels are scaled from `|p2 - p1|`; a zero-distance pair yields all
//! levels equal, which downstream sizing must guard against.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::types::Trend;

/// Retracement and extension prices derived from a single swing pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevels {
    /// Ratio 0.0: the impulse end `p2`
    pub level_0: Decimal,
    pub level_382: Decimal,
    pub level_500: Decimal,
    pub level_618: Decimal,
    /// Ratio 1.0: the impulse anchor `p1`
    pub level_1000: Decimal,
    /// 100% extension beyond `p2`
    pub ext_1000: Decimal,
    /// 161.8% extension beyond `p2`
    pub ext_1618: Decimal,
}

/// Compute levels for an impulse from `p1` to `p2` under the given trend
///
/// UP: retracements step down from `p2` toward `p1`, extensions project
/// above `p2`. DOWN is the exact mirror.
pub fn levels(p1: Decimal, p2: Decimal, trend: Trend) -> FibLevels {
    let diff = (p2 - p1).abs();

    match trend {
        Trend::Up => FibLevels {
            level_0: p2,
            level_382: p2 - dec!(0.382) * diff,
            level_500: p2 - dec!(0.5) * diff,
            level_618: p2 - dec!(0.618) * diff,
            level_1000: p1,
            ext_1000: p2 + diff,
            ext_1618: p2 + dec!(1.618) * diff,
        },
        Trend::Down => FibLevels {
            level_0: p2,
            level_382: p2 + dec!(0.382) * diff,
            level_500: p2 + dec!(0.5) * diff,
            level_618: p2 + dec!(0.618) * diff,
            level_1000: p1,
            ext_1000: p2 - diff,
            ext_1618: p2 - dec!(1.618) * diff,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_up() {
        // Low = 100, high = 200, diff = 100
        let levels = levels(dec!(100), dec!(200), Trend::Up);

        assert_eq!(levels.level_0, dec!(200));
        assert_eq!(levels.level_382, dec!(161.8));
        assert_eq!(levels.level_500, dec!(150));
        assert_eq!(levels.level_618, dec!(138.2));
        assert_eq!(levels.level_1000, dec!(100));
        assert_eq!(levels.ext_1000, dec!(300));
        assert_eq!(levels.ext_1618, dec!(361.8));
    }

    #[test]
    fn test_levels_down() {
        // High = 200, low = 100, diff = 100
        let levels = levels(dec!(200), dec!(100), Trend::Down);

        assert_eq!(levels.level_0, dec!(100));
        assert_eq!(levels.level_500, dec!(150));
        assert_eq!(levels.level_1000, dec!(200));
        assert_eq!(levels.ext_1000, dec!(0));
        assert_eq!(levels.ext_1618, dec!(-61.8));
    }

    #[test]
    fn test_zero_distance_collapses() {
        let levels = levels(dec!(100), dec!(100), Trend::Up);

        assert_eq!(levels.level_0, dec!(100));
        assert_eq!(levels.level_618, dec!(100));
        assert_eq!(levels.ext_1618, dec!(100));
    }
}
