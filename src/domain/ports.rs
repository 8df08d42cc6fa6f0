//! Port traits the application layer depends on and infrastructure
//! implements, in the shape of `domain/ports.rs` / `domain/repositories.rs`
//! in the teacher codebase (`MarketDataService`, `TradeRepository`, etc).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::alert::{AlertRule, AlertRuleUpdate, AlertStats, DispatchOutcome, TriggerHistory};
use crate::domain::candle::{Bar, Candle};
use crate::domain::errors::AppResult;
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::query::QueryRequest;

/// C2: a source of OHLCV bars for one exchange.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn fetch_recent_ohlcv(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> AppResult<Vec<Bar>>;
}

/// C1: the candle store. Upsert is used by backfill, insert-only by tick
/// (spec.md §4.3).
#[async_trait]
pub trait CandleStore: Send + Sync {
    async fn upsert_bars(&self, bars: &[Bar]) -> AppResult<()>;

    /// Returns only the bars that did not already exist, in ascending
    /// `open_time` order.
    async fn insert_new_bars(&self, bars: &[Bar]) -> AppResult<Vec<Bar>>;

    async fn save_candle(&self, candle: &Candle) -> AppResult<()>;

    async fn load_window(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> AppResult<Vec<Candle>>;

    async fn query(&self, request: &QueryRequest) -> AppResult<(usize, Vec<Candle>)>;

    async fn delete_before(&self, timeframe: Timeframe, cutoff_millis: i64) -> AppResult<u64>;
}

/// C7: alert rule CRUD plus aggregate stats.
#[async_trait]
pub trait AlertRegistry: Send + Sync {
    async fn create(&self, rule: AlertRule) -> AppResult<AlertRule>;
    async fn update(&self, id: Uuid, update: AlertRuleUpdate) -> AppResult<AlertRule>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn get(&self, id: Uuid) -> AppResult<AlertRule>;
    async fn list(&self, symbol: Option<Symbol>, active_only: bool, limit: usize) -> AppResult<Vec<AlertRule>>;
    async fn list_active(&self) -> AppResult<Vec<AlertRule>>;
    async fn record_trigger(&self, id: Uuid, history: TriggerHistory) -> AppResult<()>;
    async fn stats(&self) -> AppResult<AlertStats>;
}

/// C9: outbound webhook dispatch.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, rule: &AlertRule, candle: &Candle) -> (DispatchOutcome, Option<String>);
}
