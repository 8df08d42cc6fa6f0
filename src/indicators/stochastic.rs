//! Slow Stochastic(14,3,3), hand-rolled. The `ta` crate's `SlowStochastic`
//! does not expose an independent %D smoothing period, so this follows
//! `original_source/indicators/calculator.py::calculate_stochastic`'s
//! talib-equivalent construction directly: %K is the raw stochastic over
//! `k_period`, smoothed by `smooth_k`, then %D is an SMA of that over
//! `d_period`.

fn rolling_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

/// `highs`/`lows`/`closes` must be the same length, oldest first.
pub fn stochastic_slow(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    smooth_k: usize,
    d_period: usize,
) -> Option<StochasticValue> {
    let n = closes.len();
    if n < k_period {
        return None;
    }

    let raw_k: Vec<f64> = (0..n)
        .map(|i| {
            if i + 1 < k_period {
                f64::NAN
            } else {
                let lo = i + 1 - k_period;
                let highest = highs[lo..=i].iter().cloned().fold(f64::MIN, f64::max);
                let lowest = lows[lo..=i].iter().cloned().fold(f64::MAX, f64::min);
                if (highest - lowest).abs() < f64::EPSILON {
                    50.0
                } else {
                    (closes[i] - lowest) / (highest - lowest) * 100.0
                }
            }
        })
        .collect();

    let valid_start = k_period - 1;
    let smoothed: Vec<f64> = raw_k[valid_start..].to_vec();
    let slow_k_series = rolling_sma(&smoothed, smooth_k);
    let slow_k_values: Vec<f64> = slow_k_series.into_iter().flatten().collect();
    if slow_k_values.is_empty() {
        return None;
    }
    let slow_d_series = rolling_sma(&slow_k_values, d_period);

    let k = *slow_k_values.last()?;
    let d = slow_d_series.last().copied().flatten()?;
    if k.is_nan() || d.is_nan() {
        return None;
    }
    Some(StochasticValue { k, d })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_below_warmup() {
        assert_eq!(stochastic_slow(&[1.0], &[1.0], &[1.0], 14, 3, 3), None);
    }

    #[test]
    fn flat_series_centers_at_fifty() {
        let closes = vec![10.0; 25];
        let value = stochastic_slow(&closes, &closes, &closes, 14, 3, 3).unwrap();
        assert!((value.k - 50.0).abs() < 1e-6);
        assert!((value.d - 50.0).abs() < 1e-6);
    }
}
