//! Fixed signal thresholds, grounded on
//! `original_source/config/settings.py::SIGNAL_THRESHOLDS`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub cci_oversold: f64,
    pub cci_overbought: f64,
    pub kdj_oversold: f64,
    pub kdj_overbought: f64,
    pub volume_spike_multiplier: f64,
    pub volume_dry_multiplier: f64,
    pub bb_squeeze_ratio: f64,
    pub bb_expansion_ratio: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            cci_oversold: -100.0,
            cci_overbought: 100.0,
            kdj_oversold: 0.0,
            kdj_overbought: 100.0,
            volume_spike_multiplier: 2.0,
            volume_dry_multiplier: 0.5,
            bb_squeeze_ratio: 0.8,
            bb_expansion_ratio: 1.2,
        }
    }
}
