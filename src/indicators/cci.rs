//! Commodity Channel Index(20), hand-rolled (the `ta` crate has no CCI).
//! Grounded on `original_source/indicators/calculator.py::calculate_cci`.

/// `highs`/`lows`/`closes` must be the same length, oldest first.
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = closes.len();
    if n < period {
        return None;
    }
    let typical_prices: Vec<f64> = (0..n)
        .map(|i| (highs[i] + lows[i] + closes[i]) / 3.0)
        .collect();

    let window = &typical_prices[n - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let mean_deviation = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;

    if mean_deviation.abs() < f64::EPSILON {
        return None;
    }
    let last_tp = typical_prices[n - 1];
    Some((last_tp - mean) / (0.015 * mean_deviation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_below_period() {
        assert_eq!(cci(&[1.0], &[1.0], &[1.0], 20), None);
    }

    #[test]
    fn flat_series_is_zero() {
        let closes = vec![10.0; 20];
        let value = cci(&closes, &closes, &closes, 20);
        assert_eq!(value, None);
    }

    #[test]
    fn trending_series_is_positive() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let value = cci(&closes, &closes, &closes, 20).unwrap();
        assert!(value > 0.0);
    }
}
