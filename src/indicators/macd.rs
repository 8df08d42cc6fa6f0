//! MACD(12,26,9) via `ta::indicators::MovingAverageConvergenceDivergence`.

use ta::indicators::MovingAverageConvergenceDivergence;
use ta::Next;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if closes.len() < slow + signal {
        return None;
    }
    let mut macd = MovingAverageConvergenceDivergence::new(fast, slow, signal).ok()?;
    let mut last = None;
    for &close in closes {
        last = Some(macd.next(close));
    }
    let last = last?;
    if last.macd.is_nan() || last.signal.is_nan() || last.histogram.is_nan() {
        return None;
    }
    Some(MacdValue {
        line: last.macd,
        signal: last.signal,
        histogram: last.histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_below_warmup() {
        assert_eq!(macd(&[1.0, 2.0, 3.0], 12, 26, 9), None);
    }

    #[test]
    fn produces_a_value_once_warmed_up() {
        let closes: Vec<f64> = (1..=60).map(|i| i as f64 + (i as f64 * 0.1).sin()).collect();
        assert!(macd(&closes, 12, 26, 9).is_some());
    }
}
