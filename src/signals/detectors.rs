//! One detector function per signal family (spec.md §4.5), grounded
//! line-for-line on `original_source/indicators/signals.py`'s
//! `detect_*_signals` functions. Every detector is pure `Option`-chaining:
//! a missing input silently suppresses the corresponding tag rather than
//! panicking or logging per-tag.

use crate::domain::candle::Candle;
use crate::domain::signal::SignalTag;
use crate::signals::thresholds::SignalThresholds;

fn close_f64(candle: &Candle) -> f64 {
    candle.close_f64()
}

/// Divergence only looks at the last 5 bars (`signals.py`'s `tail(5)`), not
/// the whole loaded window — an all-time extreme over a long window almost
/// never coincides with the current bar.
const DIVERGENCE_LOOKBACK: usize = 5;

/// Bearish divergence: price makes a higher high than anywhere else in the
/// window while the indicator doesn't. Bullish divergence: price makes a
/// lower low while the indicator doesn't. Mirrors the original's
/// peak-vs-peak divergence check over a rolling lookback.
fn detect_divergence(window: &[(f64, f64)]) -> (bool, bool) {
    if window.len() < 3 {
        return (false, false);
    }
    let (curr_price, curr_indicator) = *window.last().unwrap();
    let history = &window[..window.len() - 1];

    let highest = history.iter().cloned().fold((f64::MIN, f64::MIN), |acc, (p, i)| {
        if p > acc.0 {
            (p, i)
        } else {
            acc
        }
    });
    let lowest = history.iter().cloned().fold((f64::MAX, f64::MAX), |acc, (p, i)| {
        if p < acc.0 {
            (p, i)
        } else {
            acc
        }
    });

    let bearish = curr_price > highest.0 && curr_indicator < highest.1;
    let bullish = curr_price < lowest.0 && curr_indicator > lowest.1;
    (bearish, bullish)
}

pub fn detect_rsi(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };
    let Some(rsi) = curr.indicators.rsi14 else {
        return tags;
    };

    if rsi < thresholds.rsi_oversold {
        tags.push(SignalTag::RsiOversold);
    }
    if rsi > thresholds.rsi_overbought {
        tags.push(SignalTag::RsiOverbought);
    }

    let series: Vec<(f64, f64)> = window
        .iter()
        .rev()
        .take(DIVERGENCE_LOOKBACK)
        .filter_map(|c| c.indicators.rsi14.map(|v| (close_f64(c), v)))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let (bearish, bullish) = detect_divergence(&series);
    if bearish {
        tags.push(SignalTag::RsiDivergenceBearish);
    }
    if bullish {
        tags.push(SignalTag::RsiDivergenceBullish);
    }

    tags
}

pub fn detect_macd(window: &[Candle]) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    if window.len() < 2 {
        return tags;
    }
    let prev = &window[window.len() - 2];
    let curr = &window[window.len() - 1];

    if let (Some(prev_line), Some(prev_signal), Some(curr_line), Some(curr_signal)) = (
        prev.indicators.macd_line,
        prev.indicators.macd_signal,
        curr.indicators.macd_line,
        curr.indicators.macd_signal,
    ) {
        if prev_line <= prev_signal && curr_line > curr_signal {
            tags.push(SignalTag::MacdBullishCross);
        }
        if prev_line >= prev_signal && curr_line < curr_signal {
            tags.push(SignalTag::MacdBearishCross);
        }
    }

    if let (Some(prev_line), Some(curr_line)) = (prev.indicators.macd_line, curr.indicators.macd_line) {
        if prev_line <= 0.0 && curr_line > 0.0 {
            tags.push(SignalTag::MacdZeroCrossUp);
        }
        if prev_line >= 0.0 && curr_line < 0.0 {
            tags.push(SignalTag::MacdZeroCrossDown);
        }
    }

    let series: Vec<(f64, f64)> = window
        .iter()
        .rev()
        .take(DIVERGENCE_LOOKBACK)
        .filter_map(|c| c.indicators.macd_line.map(|v| (close_f64(c), v)))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let (bearish, bullish) = detect_divergence(&series);
    if bearish {
        tags.push(SignalTag::MacdDivergenceBearish);
    }
    if bullish {
        tags.push(SignalTag::MacdDivergenceBullish);
    }

    tags
}

pub fn detect_ma(window: &[Candle]) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };

    if let (Some(ma5), Some(ma20), Some(ma50)) = (curr.indicators.ma5, curr.indicators.ma20, curr.indicators.ma50) {
        if ma5 > ma20 && ma20 > ma50 {
            tags.push(SignalTag::MaBullishArrangement);
        }
        if ma5 < ma20 && ma20 < ma50 {
            tags.push(SignalTag::MaBearishArrangement);
        }
    }

    if let Some(ma50) = curr.indicators.ma50 {
        let close = close_f64(curr);
        if close > ma50 {
            tags.push(SignalTag::PriceAboveMa50);
        } else if close < ma50 {
            tags.push(SignalTag::PriceBelowMa50);
        }
    }

    if window.len() >= 2 {
        let prev = &window[window.len() - 2];
        if let (Some(prev_fast), Some(prev_slow), Some(curr_fast), Some(curr_slow)) =
            (prev.indicators.ma5, prev.indicators.ma20, curr.indicators.ma5, curr.indicators.ma20)
        {
            if prev_fast <= prev_slow && curr_fast > curr_slow {
                tags.push(SignalTag::MaGoldenCross);
            }
            if prev_fast >= prev_slow && curr_fast < curr_slow {
                tags.push(SignalTag::MaDeathCross);
            }
        }
    }

    tags
}

pub fn detect_bollinger(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };
    let Some((upper, middle, lower)) = curr
        .indicators
        .bb_upper
        .zip(curr.indicators.bb_middle)
        .zip(curr.indicators.bb_lower)
        .map(|((u, m), l)| (u, m, l))
    else {
        return tags;
    };
    let close = close_f64(curr);

    if close >= upper * 0.995 {
        tags.push(SignalTag::BbUpperTouch);
    }
    if close <= lower * 1.005 {
        tags.push(SignalTag::BbLowerTouch);
    }

    if window.len() >= 2 {
        let prev = &window[window.len() - 2];
        if let Some(prev_middle) = prev.indicators.bb_middle {
            let prev_close = close_f64(prev);
            if prev_close <= prev_middle && close > middle {
                tags.push(SignalTag::BbMiddleCrossUp);
            }
            if prev_close >= prev_middle && close < middle {
                tags.push(SignalTag::BbMiddleCrossDown);
            }
        }
    }

    let bandwidth = if middle.abs() > f64::EPSILON {
        (upper - lower) / middle
    } else {
        0.0
    };
    let recent_bandwidths: Vec<f64> = window
        .iter()
        .rev()
        .take(20)
        .filter_map(|c| {
            c.indicators
                .bb_upper
                .zip(c.indicators.bb_middle)
                .zip(c.indicators.bb_lower)
                .map(|((u, m), l)| if m.abs() > f64::EPSILON { (u - l) / m } else { 0.0 })
        })
        .collect();
    if recent_bandwidths.len() >= 5 {
        let baseline = recent_bandwidths.iter().sum::<f64>() / recent_bandwidths.len() as f64;
        if baseline > f64::EPSILON {
            if bandwidth < baseline * thresholds.bb_squeeze_ratio {
                tags.push(SignalTag::BbSqueeze);
            }
            if bandwidth > baseline * thresholds.bb_expansion_ratio {
                tags.push(SignalTag::BbExpansion);
            }
        }
    }

    tags
}

pub fn detect_kdj(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };
    let Some(j) = curr.indicators.kdj_j else {
        return tags;
    };
    if j < thresholds.kdj_oversold {
        tags.push(SignalTag::KdjOversold);
    }
    if j > thresholds.kdj_overbought {
        tags.push(SignalTag::KdjOverbought);
    }

    if window.len() >= 2 {
        let prev = &window[window.len() - 2];
        if let (Some(prev_k), Some(prev_d), Some(curr_k), Some(curr_d)) =
            (prev.indicators.kdj_k, prev.indicators.kdj_d, curr.indicators.kdj_k, curr.indicators.kdj_d)
        {
            if prev_k <= prev_d && curr_k > curr_d {
                tags.push(SignalTag::KdjGoldenCross);
            }
            if prev_k >= prev_d && curr_k < curr_d {
                tags.push(SignalTag::KdjDeathCross);
            }
        }
    }

    tags
}

pub fn detect_stochastic(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };
    let Some(k) = curr.indicators.stoch_k else {
        return tags;
    };
    if k < thresholds.stoch_oversold {
        tags.push(SignalTag::StochOversold);
    }
    if k > thresholds.stoch_overbought {
        tags.push(SignalTag::StochOverbought);
    }

    if window.len() >= 2 {
        let prev = &window[window.len() - 2];
        if let (Some(prev_k), Some(prev_d), Some(curr_k), Some(curr_d)) = (
            prev.indicators.stoch_k,
            prev.indicators.stoch_d,
            curr.indicators.stoch_k,
            curr.indicators.stoch_d,
        ) {
            if prev_k <= prev_d && curr_k > curr_d {
                tags.push(SignalTag::StochBullishCross);
            }
            if prev_k >= prev_d && curr_k < curr_d {
                tags.push(SignalTag::StochBearishCross);
            }
        }
    }

    tags
}

pub fn detect_cci(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    if window.len() < 2 {
        return tags;
    }
    let prev = &window[window.len() - 2];
    let curr = &window[window.len() - 1];
    let Some(cci) = curr.indicators.cci20 else {
        return tags;
    };

    if cci < thresholds.cci_oversold {
        tags.push(SignalTag::CciOversold);
    }
    if cci > thresholds.cci_overbought {
        tags.push(SignalTag::CciOverbought);
    }

    if let Some(prev_cci) = prev.indicators.cci20 {
        if prev_cci <= 0.0 && cci > 0.0 {
            tags.push(SignalTag::CciZeroCrossUp);
        }
        if prev_cci >= 0.0 && cci < 0.0 {
            tags.push(SignalTag::CciZeroCrossDown);
        }
    }

    tags
}

pub fn detect_volume(window: &[Candle], thresholds: &SignalThresholds) -> Vec<SignalTag> {
    let mut tags = Vec::new();
    let Some(curr) = window.last() else {
        return tags;
    };
    let curr_volume: f64 = curr.bar.volume.to_string().parse().unwrap_or(0.0);

    let baseline_window: Vec<f64> = window[..window.len().saturating_sub(1)]
        .iter()
        .rev()
        .take(19)
        .map(|c| c.bar.volume.to_string().parse().unwrap_or(0.0))
        .collect();
    if baseline_window.len() < 5 {
        return tags;
    }
    let baseline = baseline_window.iter().sum::<f64>() / baseline_window.len() as f64;
    if baseline <= f64::EPSILON {
        return tags;
    }

    if curr_volume >= baseline * thresholds.volume_spike_multiplier {
        tags.push(SignalTag::VolumeSpike);
    }
    if curr_volume <= baseline * thresholds.volume_dry_multiplier {
        tags.push(SignalTag::VolumeDry);
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Bar, Candle, Indicators};
    use crate::domain::market::{Symbol, Timeframe};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle_with(close: Decimal, volume: Decimal, indicators: Indicators) -> Candle {
        let bar = Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume,
        };
        let mut candle = Candle::new(bar);
        candle.indicators = indicators;
        candle
    }

    #[test]
    fn rsi_oversold_triggers_below_threshold() {
        let thresholds = SignalThresholds::default();
        let candle = candle_with(
            dec!(100),
            dec!(10),
            Indicators {
                rsi14: Some(25.0),
                ..Default::default()
            },
        );
        let tags = detect_rsi(&[candle], &thresholds);
        assert!(tags.contains(&SignalTag::RsiOversold));
    }

    #[test]
    fn macd_bullish_cross_detected() {
        let prev = candle_with(
            dec!(100),
            dec!(10),
            Indicators {
                macd_line: Some(-1.0),
                macd_signal: Some(0.0),
                ..Default::default()
            },
        );
        let curr = candle_with(
            dec!(101),
            dec!(10),
            Indicators {
                macd_line: Some(1.0),
                macd_signal: Some(0.0),
                ..Default::default()
            },
        );
        let tags = detect_macd(&[prev, curr]);
        assert!(tags.contains(&SignalTag::MacdBullishCross));
    }

    #[test]
    fn volume_spike_detected_above_baseline() {
        let thresholds = SignalThresholds::default();
        let mut window: Vec<Candle> = (0..19)
            .map(|_| candle_with(dec!(100), dec!(10), Indicators::default()))
            .collect();
        window.push(candle_with(dec!(100), dec!(100), Indicators::default()));
        let tags = detect_volume(&window, &thresholds);
        assert!(tags.contains(&SignalTag::VolumeSpike));
    }
}
