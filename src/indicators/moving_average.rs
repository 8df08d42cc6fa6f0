//! Simple moving averages over a closed window of closes. Thin wrapper
//! around `ta::indicators::SimpleMovingAverage`, fed forward exactly the way
//! `TechnicalFeatureEngineeringService::update` drives its own `ta`
//! indicators in the teacher codebase.

use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// Returns `None` until `closes.len() >= period`.
pub fn simple_moving_average(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    let mut last = f64::NAN;
    for &close in closes {
        last = sma.next(close);
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
    fn returns_none_below_period() {
        assert_eq!(simple_moving_average(&[1.0, 2.0], 5), None);
    }

    #[test]
    fn matches_manual_average_once_full() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ma = simple_moving_average(&closes, 5).unwrap();
        assert!((ma - 3.0).abs() < 1e-9);
    }
}
