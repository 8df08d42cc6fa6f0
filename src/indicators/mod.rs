pub mod bollinger;
pub mod cci;
pub mod engine;
pub mod kdj;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;

pub use engine::{IndicatorConfig, IndicatorEngine};
