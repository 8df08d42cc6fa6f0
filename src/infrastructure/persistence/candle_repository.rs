//! `sqlx`-backed `CandleStore`. Bars are idempotently upserted by natural
//! key; the predicate tree itself is never pushed into SQL (see
//! `query::evaluator`) — this repository only prefilters by symbol,
//! timeframe and time range and hands the rows back for in-process
//! evaluation.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use crate::domain::candle::{Bar, Candle, Indicators};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::ports::CandleStore;
use crate::domain::query::QueryRequest;
use crate::domain::signal::SignalTag;
use crate::infrastructure::persistence::database::Database;

pub struct SqliteCandleRepository {
    db: Database,
}

impl SqliteCandleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn decimal_to_text(value: Decimal) -> String {
    value.to_string()
}

fn text_to_decimal(value: &str) -> AppResult<Decimal> {
    Decimal::from_str(value).map_err(|e| AppError::Store(format!("corrupt decimal column: {e}")))
}

#[async_trait]
impl CandleStore for SqliteCandleRepository {
    async fn upsert_bars(&self, bars: &[Bar]) -> AppResult<()> {
        for bar in bars {
            bar.validate()?;
            let now = Utc::now().timestamp_millis();
            sqlx::query(
                r#"
                INSERT INTO candles
                    (symbol, timeframe, bar_open_time, open, high, low, close, volume,
                     signals, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)
                ON CONFLICT(symbol, timeframe, bar_open_time) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(bar.symbol.as_str())
            .bind(bar.timeframe.as_str())
            .bind(bar.open_time.timestamp_millis())
            .bind(decimal_to_text(bar.open))
            .bind(decimal_to_text(bar.high))
            .bind(decimal_to_text(bar.low))
            .bind(decimal_to_text(bar.close))
            .bind(bar.volume.to_string().parse::<f64>().unwrap_or(0.0))
            .bind(now)
            .execute(&self.db.pool)
            .await?;
        }
        Ok(())
    }

    async fn insert_new_bars(&self, bars: &[Bar]) -> AppResult<Vec<Bar>> {
        let mut inserted = Vec::new();
        for bar in bars {
            bar.validate()?;
            let now = Utc::now().timestamp_millis();
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO candles
                    (symbol, timeframe, bar_open_time, open, high, low, close, volume,
                     signals, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)
                "#,
            )
            .bind(bar.symbol.as_str())
            .bind(bar.timeframe.as_str())
            .bind(bar.open_time.timestamp_millis())
            .bind(decimal_to_text(bar.open))
            .bind(decimal_to_text(bar.high))
            .bind(decimal_to_text(bar.low))
            .bind(decimal_to_text(bar.close))
            .bind(bar.volume.to_string().parse::<f64>().unwrap_or(0.0))
            .bind(now)
            .execute(&self.db.pool)
            .await?;
            if result.rows_affected() > 0 {
                inserted.push(bar.clone());
            }
        }
        Ok(inserted)
    }

    async fn save_candle(&self, candle: &Candle) -> AppResult<()> {
        let signals_json = serde_json::to_string(
            &candle.signals.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            UPDATE candles SET
                ma5 = ?1, ma10 = ?2, ma20 = ?3, ma50 = ?4,
                rsi14 = ?5,
                macd_line = ?6, macd_signal = ?7, macd_hist = ?8,
                stoch_k = ?9, stoch_d = ?10,
                bb_upper = ?11, bb_middle = ?12, bb_lower = ?13,
                cci20 = ?14,
                kdj_k = ?15, kdj_d = ?16, kdj_j = ?17,
                skdj_k = ?18, skdj_d = ?19,
                signals = ?20,
                updated_at = ?21
            WHERE symbol = ?22 AND timeframe = ?23 AND bar_open_time = ?24
            "#,
        )
        .bind(candle.indicators.ma5)
        .bind(candle.indicators.ma10)
        .bind(candle.indicators.ma20)
        .bind(candle.indicators.ma50)
        .bind(candle.indicators.rsi14)
        .bind(candle.indicators.macd_line)
        .bind(candle.indicators.macd_signal)
        .bind(candle.indicators.macd_hist)
        .bind(candle.indicators.stoch_k)
        .bind(candle.indicators.stoch_d)
        .bind(candle.indicators.bb_upper)
        .bind(candle.indicators.bb_middle)
        .bind(candle.indicators.bb_lower)
        .bind(candle.indicators.cci20)
        .bind(candle.indicators.kdj_k)
        .bind(candle.indicators.kdj_d)
        .bind(candle.indicators.kdj_j)
        .bind(candle.indicators.skdj_k)
        .bind(candle.indicators.skdj_d)
        .bind(signals_json)
        .bind(now)
        .bind(candle.bar.symbol.as_str())
        .bind(candle.bar.timeframe.as_str())
        .bind(candle.bar.open_time.timestamp_millis())
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn load_window(&self, symbol: Symbol, timeframe: Timeframe, limit: usize) -> AppResult<Vec<Candle>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM (
                SELECT * FROM candles
                WHERE symbol = ?1 AND timeframe = ?2
                ORDER BY bar_open_time DESC
                LIMIT ?3
            ) ORDER BY bar_open_time ASC
            "#,
        )
        .bind(symbol.as_str())
        .bind(timeframe.as_str())
        .bind(limit as i64)
        .fetch_all(&self.db.pool)
        .await?;

        rows.iter().map(row_to_candle).collect()
    }

    async fn query(&self, request: &QueryRequest) -> AppResult<(usize, Vec<Candle>)> {
        let symbol = request.symbol.ok_or_else(|| AppError::validation("symbol required"))?;
        let timeframe = request
            .timeframe
            .ok_or_else(|| AppError::validation("timeframe required"))?;
        let candles = self.load_window(symbol, timeframe, 1000).await?;
        Ok((candles.len(), candles))
    }

    async fn delete_before(&self, timeframe: Timeframe, cutoff_millis: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM candles WHERE timeframe = ?1 AND bar_open_time < ?2")
            .bind(timeframe.as_str())
            .bind(cutoff_millis)
            .execute(&self.db.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_candle(row: &sqlx::sqlite::SqliteRow) -> AppResult<Candle> {
    let symbol: String = row.try_get("symbol")?;
    let timeframe: String = row.try_get("timeframe")?;
    let open_time_ms: i64 = row.try_get("bar_open_time")?;
    let volume: f64 = row.try_get("volume")?;

    let bar = Bar {
        symbol: Symbol::from_str(&symbol)?,
        timeframe: Timeframe::from_str(&timeframe)?,
        open_time: millis_to_datetime(open_time_ms)?,
        open: text_to_decimal(&row.try_get::<String, _>("open")?)?,
        high: text_to_decimal(&row.try_get::<String, _>("high")?)?,
        low: text_to_decimal(&row.try_get::<String, _>("low")?)?,
        close: text_to_decimal(&row.try_get::<String, _>("close")?)?,
        volume: Decimal::try_from(volume).unwrap_or(Decimal::ZERO),
    };

    let signals_json: String = row.try_get("signals")?;
    let signal_strings: Vec<String> =
        serde_json::from_str(&signals_json).map_err(|e| AppError::Store(e.to_string()))?;
    let signals: BTreeSet<SignalTag> = signal_strings
        .iter()
        .filter_map(|s| s.parse::<SignalTag>().ok())
        .collect();

    let created_at_ms: i64 = row.try_get("created_at")?;
    let updated_at_ms: i64 = row.try_get("updated_at")?;

    Ok(Candle {
        bar,
        indicators: Indicators {
            ma5: row.try_get("ma5")?,
            ma10: row.try_get("ma10")?,
            ma20: row.try_get("ma20")?,
            ma50: row.try_get("ma50")?,
            rsi14: row.try_get("rsi14")?,
            macd_line: row.try_get("macd_line")?,
            macd_signal: row.try_get("macd_signal")?,
            macd_hist: row.try_get("macd_hist")?,
            stoch_k: row.try_get("stoch_k")?,
            stoch_d: row.try_get("stoch_d")?,
            bb_upper: row.try_get("bb_upper")?,
            bb_middle: row.try_get("bb_middle")?,
            bb_lower: row.try_get("bb_lower")?,
            cci20: row.try_get("cci20")?,
            kdj_k: row.try_get("kdj_k")?,
            kdj_d: row.try_get("kdj_d")?,
            kdj_j: row.try_get("kdj_j")?,
            skdj_k: row.try_get("skdj_k")?,
            skdj_d: row.try_get("skdj_d")?,
        },
        signals,
        created_at: millis_to_datetime(created_at_ms)?,
        updated_at: millis_to_datetime(updated_at_ms)?,
    })
}

fn millis_to_datetime(millis: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::Store(format!("invalid timestamp: {millis}")))
}
