//! Wilder RSI via `ta::indicators::RelativeStrengthIndex`, matching the
//! period the original `TECHNICAL_INDICATORS["RSI_PERIOD"]` config names (14).

use ta::indicators::RelativeStrengthIndex;
use ta::Next;

pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period + 1 {
        return None;
    }
    let mut rsi = RelativeStrengthIndex::new(period).ok()?;
    let mut last = f64::NAN;
    for &close in closes {
        last = rsi.next(close);
    }
    if last.is_nan() {
        None
    } else {
        Some(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_is_bounded_between_zero_and_hundred() {
        let closes: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let value = rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn returns_none_without_enough_data() {
        assert_eq!(rsi(&[1.0, 2.0], 14), None);
    }
}
