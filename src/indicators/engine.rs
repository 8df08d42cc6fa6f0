//! C4: the indicator engine. Loads a window of candles from the store and
//! computes every indicator onto the latest bar only, skipping the whole
//! pass (leaving every field `None`) below the 50-bar warm-up gate, exactly
//! as `original_source/indicators/calculator.py::calculate_all_indicators`
//! requires `len(df) >= 50` before doing any work.

use crate::domain::candle::{Bar, Indicators};
use crate::indicators::{bollinger, cci, kdj, macd, moving_average, rsi, stochastic};

pub const WARMUP_BARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorConfig {
    pub ma_periods: [usize; 4],
    pub rsi_period: usize,
    pub macd: (usize, usize, usize),
    pub stoch: (usize, usize, usize),
    pub bollinger: (usize, f64),
    pub cci_period: usize,
    pub kdj: (usize, f64),
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_periods: [5, 10, 20, 50],
            rsi_period: 14,
            macd: (12, 26, 9),
            stoch: (14, 3, 3),
            bollinger: (20, 2.0),
            cci_period: 20,
            kdj: (9, 3.0),
        }
    }
}

pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    /// `window` must be in ascending `open_time` order; the last element is
    /// the bar indicators are computed onto.
    pub fn compute(&self, window: &[Bar]) -> Indicators {
        if window.len() < WARMUP_BARS {
            return Indicators::default();
        }

        let closes: Vec<f64> = window.iter().map(bar_close).collect();
        let highs: Vec<f64> = window.iter().map(bar_high).collect();
        let lows: Vec<f64> = window.iter().map(bar_low).collect();

        let [p5, p10, p20, p50] = self.config.ma_periods;
        let macd_value = macd::macd(&closes, self.config.macd.0, self.config.macd.1, self.config.macd.2);
        let stoch_value = stochastic::stochastic_slow(
            &highs,
            &lows,
            &closes,
            self.config.stoch.0,
            self.config.stoch.1,
            self.config.stoch.2,
        );
        let bb_value = bollinger::bollinger_bands(&closes, self.config.bollinger.0, self.config.bollinger.1);
        let kdj_value = kdj::kdj(&highs, &lows, &closes, self.config.kdj.0, self.config.kdj.1);

        Indicators {
            ma5: moving_average::simple_moving_average(&closes, p5),
            ma10: moving_average::simple_moving_average(&closes, p10),
            ma20: moving_average::simple_moving_average(&closes, p20),
            ma50: moving_average::simple_moving_average(&closes, p50),
            rsi14: rsi::rsi(&closes, self.config.rsi_period),
            macd_line: macd_value.map(|v| v.line),
            macd_signal: macd_value.map(|v| v.signal),
            macd_hist: macd_value.map(|v| v.histogram),
            stoch_k: stoch_value.map(|v| v.k),
            stoch_d: stoch_value.map(|v| v.d),
            bb_upper: bb_value.map(|v| v.upper),
            bb_middle: bb_value.map(|v| v.middle),
            bb_lower: bb_value.map(|v| v.lower),
            cci20: cci::cci(&highs, &lows, &closes, self.config.cci_period),
            kdj_k: kdj_value.map(|v| v.k),
            kdj_d: kdj_value.map(|v| v.d),
            kdj_j: kdj_value.map(|v| v.j),
            // O3: Stochastic-slow is computed once and aliased under `skdj`.
            skdj_k: stoch_value.map(|v| v.k),
            skdj_d: stoch_value.map(|v| v.d),
        }
    }
}

fn bar_close(bar: &Bar) -> f64 {
    bar.close.to_string().parse().unwrap_or(f64::NAN)
}

fn bar_high(bar: &Bar) -> f64 {
    bar.high.to_string().parse().unwrap_or(f64::NAN)
}

fn bar_low(bar: &Bar) -> f64 {
    bar.low.to_string().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{Symbol, Timeframe};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar_at(i: i64, price: Decimal) -> Bar {
        Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now() + chrono::Duration::minutes(i * 5),
            open: price,
            high: price + dec!(1),
            low: price - dec!(1),
            close: price,
            volume: dec!(100),
        }
    }

    #[test]
    fn below_warmup_everything_is_none() {
        let window: Vec<Bar> = (0..10).map(|i| bar_at(i, dec!(100))).collect();
        let engine = IndicatorEngine::new(IndicatorConfig::default());
        let indicators = engine.compute(&window);
        assert_eq!(indicators, Indicators::default());
    }

    #[test]
    fn above_warmup_produces_values() {
        let window: Vec<Bar> = (0..60)
            .map(|i| bar_at(i, Decimal::from(100 + i)))
            .collect();
        let engine = IndicatorEngine::new(IndicatorConfig::default());
        let indicators = engine.compute(&window);
        assert!(indicators.ma5.is_some());
        assert!(indicators.ma50.is_some());
        assert!(indicators.rsi14.is_some());
        assert!(indicators.macd_line.is_some());
        assert!(indicators.kdj_k.is_some());
        assert!(indicators.skdj_k.is_some());
    }
}
