//! C5: the signal engine. Runs every detector family over a loaded window
//! and folds the results into a deterministic `BTreeSet` before storage.

use std::collections::BTreeSet;

use crate::domain::candle::Candle;
use crate::domain::signal::SignalTag;
use crate::signals::detectors;
use crate::signals::thresholds::SignalThresholds;

pub struct SignalEngine {
    thresholds: SignalThresholds,
}

impl SignalEngine {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    /// `window` must be in ascending `open_time` order, latest bar last.
    pub fn detect(&self, window: &[Candle]) -> BTreeSet<SignalTag> {
        let mut tags = BTreeSet::new();
        tags.extend(detectors::detect_rsi(window, &self.thresholds));
        tags.extend(detectors::detect_macd(window));
        tags.extend(detectors::detect_ma(window));
        tags.extend(detectors::detect_bollinger(window, &self.thresholds));
        tags.extend(detectors::detect_kdj(window, &self.thresholds));
        tags.extend(detectors::detect_stochastic(window, &self.thresholds));
        tags.extend(detectors::detect_cci(window, &self.thresholds));
        tags.extend(detectors::detect_volume(window, &self.thresholds));

        tracing::debug!(count = tags.len(), "computed signal set");
        tags
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(SignalThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Bar, Indicators};
    use crate::domain::market::{Symbol, Timeframe};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_window_yields_no_signals() {
        let engine = SignalEngine::default();
        assert!(engine.detect(&[]).is_empty());
    }

    #[test]
    fn rsi_oversold_surfaces_through_the_engine() {
        let bar = Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100),
            volume: dec!(10),
        };
        let mut candle = Candle::new(bar);
        candle.indicators = Indicators {
            rsi14: Some(20.0),
            ..Default::default()
        };
        let engine = SignalEngine::default();
        let tags = engine.detect(&[candle]);
        assert!(tags.contains(&SignalTag::RsiOversold));
    }
}
