//! KDJ(9,3), hand-rolled recurrence. Grounded on
//! `original_source/indicators/calculator.py::calculate_kdj`: RSV is the raw
//! stochastic over `period`, K and D are exponentially smoothed starting
//! from 50, and J is derived, never smoothed, from K and D.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjValue {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

/// `highs`/`lows`/`closes` must be the same length, oldest first. Recomputes
/// the whole recurrence over the supplied window every call (stateless,
/// matching the original's per-call recompute-from-window approach) so this
/// stays idempotent across repeated indicator passes.
pub fn kdj(highs: &[f64], lows: &[f64], closes: &[f64], period: usize, smooth: f64) -> Option<KdjValue> {
    let n = closes.len();
    if n < period {
        return None;
    }

    let mut k = 50.0_f64;
    let mut d = 50.0_f64;
    let alpha = 1.0 / smooth;
    let beta = 1.0 - alpha;

    for i in (period - 1)..n {
        let lo = i + 1 - period;
        let highest = highs[lo..=i].iter().cloned().fold(f64::MIN, f64::max);
        let lowest = lows[lo..=i].iter().cloned().fold(f64::MAX, f64::min);
        if (highest - lowest).abs() < f64::EPSILON {
            continue;
        }
        let rsv = (closes[i] - lowest) / (highest - lowest) * 100.0;
        k = beta * k + alpha * rsv;
        d = beta * d + alpha * k;
    }

    let j = 3.0 * k - 2.0 * d;
    if k.is_nan() || d.is_nan() || j.is_nan() {
        None
    } else {
        Some(KdjValue { k, d, j })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_below_period() {
        assert_eq!(kdj(&[1.0], &[1.0], &[1.0], 9, 3.0), None);
    }

    #[test]
    fn flat_series_holds_seed_values() {
        let closes = vec![10.0; 15];
        let value = kdj(&closes, &closes, &closes, 9, 3.0).unwrap();
        assert!((value.k - 50.0).abs() < 1e-6);
        assert!((value.d - 50.0).abs() < 1e-6);
        assert!((value.j - 50.0).abs() < 1e-6);
    }

    #[test]
    fn j_equals_three_k_minus_two_d() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let value = kdj(&closes, &closes, &closes, 9, 3.0).unwrap();
        assert!((value.j - (3.0 * value.k - 2.0 * value.d)).abs() < 1e-9);
    }
}
