//! C2: exchange adapters. `BinanceAdapter` hits Binance's public klines REST
//! endpoint over `reqwest`, grounded on the pool/timeout configuration in
//! `infrastructure/binance.rs` in the teacher codebase. `MockAdapter`
//! generates deterministic synthetic bars for tests, grounded on the same
//! file's mock/test fixtures.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::candle::Bar;
use crate::domain::errors::{AppError, AppResult};
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::ports::ExchangeAdapter;

const BINANCE_KLINES_URL: &str = "https://api.binance.com/api/v3/klines";

pub struct BinanceAdapter {
    client: reqwest::Client,
    base_url: String,
    inter_call_delay: Duration,
}

impl BinanceAdapter {
    pub fn new(inter_call_delay_ms: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(AppError::from)?;
        Ok(Self {
            client,
            base_url: BINANCE_KLINES_URL.to_string(),
            inter_call_delay: Duration::from_millis(inter_call_delay_ms.max(100)),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    async fn fetch_recent_ohlcv(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> AppResult<Vec<Bar>> {
        tokio::time::sleep(self.inter_call_delay).await;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("symbol", symbol.to_exchange_pair()),
                ("interval", timeframe.to_binance_string()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TransientUpstream(e.to_string()))?;

        if !response.status().is_success() {
            if response.status().as_u16() == 429 {
                return Err(AppError::TransientUpstream("rate limited by exchange".into()));
            }
            return Err(AppError::TransientUpstream(format!(
                "exchange returned status {}",
                response.status()
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| AppError::TransientUpstream(format!("invalid response body: {e}")))?;

        rows.iter()
            .map(|row| parse_kline_row(symbol, timeframe, row))
            .collect()
    }
}

fn parse_kline_row(symbol: Symbol, timeframe: Timeframe, row: &Value) -> AppResult<Bar> {
    let array = row
        .as_array()
        .ok_or_else(|| AppError::TransientUpstream("malformed kline row".into()))?;
    if array.len() < 6 {
        return Err(AppError::TransientUpstream("kline row too short".into()));
    }

    let field_str = |i: usize| -> AppResult<String> {
        array[i]
            .as_str()
            .map(str::to_string)
            .or_else(|| array[i].as_f64().map(|n| n.to_string()))
            .ok_or_else(|| AppError::TransientUpstream(format!("missing kline field {i}")))
    };
    let open_time_ms = array[0]
        .as_i64()
        .ok_or_else(|| AppError::TransientUpstream("missing open time".into()))?;

    Ok(Bar {
        symbol,
        timeframe,
        open_time: Utc
            .timestamp_millis_opt(open_time_ms)
            .single()
            .ok_or_else(|| AppError::TransientUpstream("invalid open time".into()))?,
        open: parse_decimal(&field_str(1)?)?,
        high: parse_decimal(&field_str(2)?)?,
        low: parse_decimal(&field_str(3)?)?,
        close: parse_decimal(&field_str(4)?)?,
        volume: parse_decimal(&field_str(5)?)?,
    })
}

fn parse_decimal(value: &str) -> AppResult<Decimal> {
    value
        .parse()
        .map_err(|_| AppError::TransientUpstream(format!("malformed decimal field: {value}")))
}

/// Deterministic synthetic OHLCV generator for tests and fixtures. No
/// network calls, no randomness.
#[derive(Clone, Default)]
pub struct MockAdapter;

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    async fn fetch_recent_ohlcv(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> AppResult<Vec<Bar>> {
        let now = Utc::now();
        let step = chrono::Duration::seconds(timeframe.to_seconds());
        let mut price = Decimal::from(30_000);

        let bars = (0..limit)
            .map(|i| {
                let open_time = now - step * ((limit - i) as i32);
                let drift = Decimal::from((i % 7) as i64) - Decimal::from(3);
                price += drift;
                Bar {
                    symbol,
                    timeframe,
                    open_time,
                    open: price,
                    high: price + Decimal::from(5),
                    low: price - Decimal::from(5),
                    close: price + Decimal::from((i % 3) as i64),
                    volume: Decimal::from(100 + (i % 50) as i64),
                }
            })
            .collect();
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_adapter_produces_requested_count() {
        let adapter = MockAdapter;
        let bars = adapter
            .fetch_recent_ohlcv(Symbol::Btc, Timeframe::FiveMin, 60)
            .await
            .unwrap();
        assert_eq!(bars.len(), 60);
        for bar in &bars {
            assert!(bar.validate().is_ok());
        }
    }

    #[test]
    fn parses_a_well_formed_kline_row() {
        let row = serde_json::json!([
            1700000000000i64,
            "30000.00",
            "30100.50",
            "29950.25",
            "30050.00",
            "123.456",
        ]);
        let bar = parse_kline_row(Symbol::Btc, Timeframe::FiveMin, &row).unwrap();
        assert_eq!(bar.open.to_string(), "30000.00");
        assert_eq!(bar.close.to_string(), "30050.00");
    }
}
