//! Closed identity enums for the instruments and intervals this engine
//! tracks. Grounded on `domain/market/timeframe.rs` in the teacher codebase,
//! narrowed to the fixed symbol/timeframe sets this spec names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Btc,
    Eth,
}

impl Symbol {
    pub fn all() -> &'static [Symbol] {
        &[Symbol::Btc, Symbol::Eth]
    }

    /// Fixed internal-tag -> exchange-pair mapping (spec.md §6).
    pub fn to_exchange_pair(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTCUSDT",
            Symbol::Eth => "ETHUSDT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Eth => "ETH",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = crate::domain::errors::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" => Ok(Symbol::Btc),
            "ETH" => Ok(Symbol::Eth),
            other => Err(Self::Err::validation(format!("invalid symbol: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    FiveMin,
    FifteenMin,
    OneHour,
    OneDay,
}

impl Timeframe {
    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::FiveMin,
            Timeframe::FifteenMin,
            Timeframe::OneHour,
            Timeframe::OneDay,
        ]
    }

    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::OneHour => 60,
            Timeframe::OneDay => 1440,
        }
    }

    pub fn to_seconds(&self) -> i64 {
        self.to_minutes() * 60
    }

    /// Binance kline interval string (infrastructure::binance translates
    /// through this, never hard-codes the string itself).
    pub fn to_binance_string(&self) -> &'static str {
        match self {
            Timeframe::FiveMin => "5m",
            Timeframe::FifteenMin => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::OneDay => "1d",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.to_binance_string()
    }

    /// Rows at this timeframe are subject to the 30-day retention sweep
    /// (spec.md §3, §6).
    pub fn is_retention_eligible(&self) -> bool {
        matches!(self, Timeframe::FiveMin | Timeframe::FifteenMin)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = crate::domain::errors::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Timeframe::FiveMin),
            "15m" => Ok(Timeframe::FifteenMin),
            "1h" => Ok(Timeframe::OneHour),
            "1d" => Ok(Timeframe::OneDay),
            other => Err(Self::Err::validation(format!("invalid timeframe: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trips_through_exchange_pair() {
        assert_eq!(Symbol::Btc.to_exchange_pair(), "BTCUSDT");
        assert_eq!(Symbol::Eth.to_exchange_pair(), "ETHUSDT");
    }

    #[test]
    fn timeframe_parses_from_binance_string() {
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::OneHour);
        assert!("3m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn retention_eligibility_matches_spec() {
        assert!(Timeframe::FiveMin.is_retention_eligible());
        assert!(Timeframe::FifteenMin.is_retention_eligible());
        assert!(!Timeframe::OneHour.is_retention_eligible());
        assert!(!Timeframe::OneDay.is_retention_eligible());
    }
}
