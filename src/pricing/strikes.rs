//! Strike ladder generation around a spot price.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default spacing between candidate strikes, as a fraction of spot (2.5%).
pub const DEFAULT_SPACING: Decimal = dec!(0.025);

/// Generate a ladder of candidate strikes around the spot price.
///
/// Produces `2 * per_side + 1` candidates at `spot * (1 + i * spacing)` for
/// `i` in `[-per_side, per_side]`, then applies exchange-style rounding:
/// strikes below 50 snap to the nearest 0.50, strikes at or above 50 to the
/// nearest whole unit. The result is ascending and deduplicated; rounding
/// can collapse neighboring candidates near the 50 boundary.
pub fn generate_strikes(spot: Decimal, per_side: u32, spacing: Decimal) -> Vec<Decimal> {
    let mut strikes = BTreeSet::new();
    let n = per_side as i64;

    for i in -n..=n {
        let raw = spot * (Decimal::ONE + Decimal::from(i) * spacing);
        let rounded = if raw < dec!(50) {
            (raw * dec!(2)).round() / dec!(2)
        } else {
            raw.round()
        };
        strikes.insert(rounded.normalize());
    }

    strikes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_around_100() {
        let strikes = generate_strikes(dec!(100), 3, DEFAULT_SPACING);
        // 92.5 and 102.5 round to even, 97.5 and 107.5 round up to even
        assert_eq!(
            strikes,
            vec![
                dec!(92),
                dec!(95),
                dec!(98),
                dec!(100),
                dec!(102),
                dec!(105),
                dec!(108)
            ]
        );
    }

    #[test]
    fn test_ladder_ascending_unique() {
        let strikes = generate_strikes(dec!(180), 5, DEFAULT_SPACING);
        assert_eq!(strikes.len(), 11);
        for pair in strikes.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_half_point_rounding_below_50() {
        let strikes = generate_strikes(dec!(40), 2, DEFAULT_SPACING);
        // 38, 39, 40, 41, 42 at 2.5% spacing on a $40 stock
        assert_eq!(
            strikes,
            vec![dec!(38), dec!(39), dec!(40), dec!(41), dec!(42)]
        );
        // Fractional spot keeps 0.50 increments
        let strikes = generate_strikes(dec!(41.30), 1, DEFAULT_SPACING);
        for s in &strikes {
            assert_eq!((s * dec!(2)).fract(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_rounding_collapse_dedups() {
        // Tight spacing on a low-priced stock collapses neighbors onto the
        // same 0.50 increment; duplicates must not survive.
        let strikes = generate_strikes(dec!(10), 4, dec!(0.01));
        let mut sorted = strikes.clone();
        sorted.dedup();
        assert_eq!(strikes, sorted);
        assert!(strikes.len() < 9);
    }
}
