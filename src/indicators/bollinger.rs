//! Bollinger Bands(20,2) via `ta::indicators::BollingerBands`.

use ta::indicators::BollingerBands;
use ta::Next;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn bollinger_bands(closes: &[f64], period: usize, std_dev: f64) -> Option<BollingerValue> {
    if closes.len() < period {
        return None;
    }
    let mut bb = BollingerBands::new(period, std_dev).ok()?;
    let mut last = None;
    for &close in closes {
        last = Some(bb.next(close));
    }
    let last = last?;
    if last.upper.is_nan() || last.average.is_nan() || last.lower.is_nan() {
        return None;
    }
    Some(BollingerValue {
        upper: last.upper,
        middle: last.average,
        lower: last.lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_band_is_above_lower_band() {
        let closes: Vec<f64> = (1..=30).map(|i| i as f64 + (i as f64).sin()).collect();
        let bands = bollinger_bands(&closes, 20, 2.0).unwrap();
        assert!(bands.upper > bands.lower);
        assert!(bands.middle > bands.lower && bands.middle < bands.upper);
    }
}
