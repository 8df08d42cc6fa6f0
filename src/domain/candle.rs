//! The candle record (spec.md §3). Grounded on `domain/market/timeframe_candle.rs`
//! in the teacher codebase, extended with the nullable indicator columns and
//! the closed signal set this spec's candle store carries per row.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{AppError, AppResult};
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::signal::SignalTag;

/// A single OHLCV bar as read from the exchange, before any indicator or
/// signal has been computed onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// I3: a bar's high/low must bound its open/close, and all prices and
    /// volume must be non-negative.
    pub fn validate(&self) -> AppResult<()> {
        if self.open < Decimal::ZERO || self.close < Decimal::ZERO {
            return Err(AppError::validation("open/close must be non-negative"));
        }
        if self.volume < Decimal::ZERO {
            return Err(AppError::validation("volume must be non-negative"));
        }
        if self.high < self.low {
            return Err(AppError::validation("high must be >= low"));
        }
        if self.high < self.open || self.high < self.close {
            return Err(AppError::validation("high must bound open and close"));
        }
        if self.low > self.open || self.low > self.close {
            return Err(AppError::validation("low must bound open and close"));
        }
        Ok(())
    }
}

/// Every scalar indicator value this engine computes onto a bar. Each field
/// is `None` until the warm-up window (50 bars, spec.md §4.4) has been
/// satisfied, and stays `None` forever if the underlying arithmetic produced
/// NaN rather than a storable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub cci20: Option<f64>,
    pub kdj_k: Option<f64>,
    pub kdj_d: Option<f64>,
    pub kdj_j: Option<f64>,
    /// O3: Stochastic-slow K/D re-exposed under the `skdj` name too, so both
    /// keys resolve to the same computed value.
    pub skdj_k: Option<f64>,
    pub skdj_d: Option<f64>,
}

/// A fully processed candle: the raw bar, its computed indicators, and the
/// set of signal tags detected on it. This is the row shape persisted by
/// the candle store and the unit the query engine filters over.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub bar: Bar,
    pub indicators: Indicators,
    pub signals: BTreeSet<SignalTag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candle {
    pub fn new(bar: Bar) -> Self {
        let now = Utc::now();
        Self {
            bar,
            indicators: Indicators::default(),
            signals: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn close_f64(&self) -> f64 {
        self.bar.close.to_string().parse().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_bar() -> Bar {
        Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: dec!(100),
            high: dec!(110),
            low: dec!(95),
            close: dec!(105),
            volume: dec!(42),
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn high_below_low_is_rejected() {
        let mut bar = sample_bar();
        bar.high = dec!(90);
        assert!(bar.validate().is_err());
    }

    #[test]
    fn negative_volume_is_rejected() {
        let mut bar = sample_bar();
        bar.volume = dec!(-1);
        assert!(bar.validate().is_err());
    }

    #[test]
    fn new_candle_has_empty_indicators_and_signals() {
        let candle = Candle::new(sample_bar());
        assert_eq!(candle.indicators, Indicators::default());
        assert!(candle.signals.is_empty());
    }
}
