//! Process-wide configuration, loaded once from environment variables.
//! Grounded on `config/mod.rs` in the teacher codebase: `dotenvy` loads a
//! `.env` file if present, `Config::from_env()` validates eagerly, and
//! invalid enum values fail fast with `anyhow::bail!` rather than falling
//! back to a silent default.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;

use crate::indicators::IndicatorConfig;
use crate::signals::SignalThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Binance,
    Mock,
}

impl FromStr for Exchange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "mock" => Ok(Exchange::Mock),
            other => bail!("invalid CANDELA_EXCHANGE value: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub exchange: Exchange,
    pub exchange_rate_limit_ms: u64,
    pub database_url: String,
    pub backfill_bars: usize,
    pub tick_bars: usize,
    pub ingestion_interval: Duration,
    pub alert_eval_interval: Duration,
    pub retention_interval: Duration,
    pub retention_max_age_days: i64,
    pub scheduler_timezone: Tz,
    pub indicators: IndicatorConfig,
    pub thresholds: SignalThresholds,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let exchange = env_or("CANDELA_EXCHANGE", "binance").parse::<Exchange>()?;
        let exchange_rate_limit_ms = env_or("CANDELA_EXCHANGE_RATE_LIMIT_MS", "250")
            .parse()
            .context("CANDELA_EXCHANGE_RATE_LIMIT_MS must be a positive integer")?;
        let database_url = env_or("CANDELA_DATABASE_URL", "sqlite://./data/candela.db");
        let backfill_bars = env_or("CANDELA_BACKFILL_BARS", "60")
            .parse()
            .context("CANDELA_BACKFILL_BARS must be a positive integer")?;
        let tick_bars = env_or("CANDELA_TICK_BARS", "5")
            .parse()
            .context("CANDELA_TICK_BARS must be a positive integer")?;
        let ingestion_interval_secs: u64 = env_or("CANDELA_INGESTION_INTERVAL_SECS", "60")
            .parse()
            .context("CANDELA_INGESTION_INTERVAL_SECS must be a positive integer")?;
        let alert_eval_interval_secs: u64 = env_or("CANDELA_ALERT_EVAL_INTERVAL_SECS", "60")
            .parse()
            .context("CANDELA_ALERT_EVAL_INTERVAL_SECS must be a positive integer")?;
        let retention_interval_secs: u64 = env_or("CANDELA_RETENTION_INTERVAL_SECS", "86400")
            .parse()
            .context("CANDELA_RETENTION_INTERVAL_SECS must be a positive integer")?;
        let retention_max_age_days = env_or("CANDELA_RETENTION_MAX_AGE_DAYS", "30")
            .parse()
            .context("CANDELA_RETENTION_MAX_AGE_DAYS must be a positive integer")?;
        let timezone_name = env_or("CANDELA_SCHEDULER_TIMEZONE", "Asia/Shanghai");
        let scheduler_timezone: Tz = timezone_name
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid CANDELA_SCHEDULER_TIMEZONE value: {timezone_name}"))?;

        if exchange_rate_limit_ms < 100 {
            bail!("CANDELA_EXCHANGE_RATE_LIMIT_MS must be at least 100ms to respect exchange rate limits");
        }

        Ok(Self {
            exchange,
            exchange_rate_limit_ms,
            database_url,
            backfill_bars,
            tick_bars,
            ingestion_interval: Duration::from_secs(ingestion_interval_secs),
            alert_eval_interval: Duration::from_secs(alert_eval_interval_secs),
            retention_interval: Duration::from_secs(retention_interval_secs),
            retention_max_age_days,
            scheduler_timezone,
            indicators: IndicatorConfig::default(),
            thresholds: SignalThresholds::default(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_parses_known_values() {
        assert_eq!("binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!("MOCK".parse::<Exchange>().unwrap(), Exchange::Mock);
    }

    #[test]
    fn exchange_rejects_unknown_values() {
        assert!("coinbase".parse::<Exchange>().is_err());
    }
}
