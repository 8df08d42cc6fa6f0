//! C3: the ingestion pipeline. `backfill()` upserts a deep history window
//! per pair; `tick()` inserts only genuinely new bars and then runs the
//! indicator and signal engines onto each of them. A `TransientUpstream`
//! error on one pair is logged and the loop moves on to the next pair,
//! grounded on the per-symbol isolation in `application/system.rs` in the
//! teacher codebase.

use std::sync::Arc;

use crate::domain::errors::AppResult;
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::ports::{CandleStore, ExchangeAdapter};
use crate::indicators::IndicatorEngine;
use crate::logging::generate_request_id;
use crate::signals::SignalEngine;
use tracing::Instrument;

pub struct IngestionPipeline {
    adapter: Arc<dyn ExchangeAdapter>,
    store: Arc<dyn CandleStore>,
    indicator_engine: IndicatorEngine,
    signal_engine: SignalEngine,
}

impl IngestionPipeline {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        store: Arc<dyn CandleStore>,
        indicator_engine: IndicatorEngine,
        signal_engine: SignalEngine,
    ) -> Self {
        Self {
            adapter,
            store,
            indicator_engine,
            signal_engine,
        }
    }

    pub async fn backfill(&self, symbols: &[Symbol], timeframes: &[Timeframe], bars: usize) {
        let request_id = generate_request_id();
        let span = tracing::info_span!("backfill", request_id = %request_id);
        async {
            for &symbol in symbols {
                for &timeframe in timeframes {
                    if let Err(e) = self.backfill_pair(symbol, timeframe, bars).await {
                        tracing::warn!(%symbol, %timeframe, error = %e, "backfill failed for pair, continuing");
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn backfill_pair(&self, symbol: Symbol, timeframe: Timeframe, bars: usize) -> AppResult<()> {
        let fetched = self.adapter.fetch_recent_ohlcv(symbol, timeframe, bars).await?;
        self.store.upsert_bars(&fetched).await?;
        self.recompute_latest(symbol, timeframe).await
    }

    pub async fn tick(&self, symbols: &[Symbol], timeframes: &[Timeframe], bars: usize) {
        let request_id = generate_request_id();
        let span = tracing::info_span!("ingestion_tick", request_id = %request_id);
        async {
            for &symbol in symbols {
                for &timeframe in timeframes {
                    if let Err(e) = self.tick_pair(symbol, timeframe, bars).await {
                        tracing::warn!(%symbol, %timeframe, error = %e, "ingestion tick failed for pair, continuing");
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn tick_pair(&self, symbol: Symbol, timeframe: Timeframe, bars: usize) -> AppResult<()> {
        let fetched = self.adapter.fetch_recent_ohlcv(symbol, timeframe, bars).await?;
        let inserted = self.store.insert_new_bars(&fetched).await?;
        if inserted.is_empty() {
            return Ok(());
        }
        self.recompute_latest(symbol, timeframe).await
    }

    /// Recomputes indicators and signals onto the latest stored bar for
    /// this pair, using the full warm-up window. Earlier bars in the window
    /// already carry the indicators a prior tick computed for them, which
    /// cross-over detectors (MACD cross, KDJ cross, ...) need alongside the
    /// freshly computed latest bar.
    async fn recompute_latest(&self, symbol: Symbol, timeframe: Timeframe) -> AppResult<()> {
        let mut window = self.store.load_window(symbol, timeframe, 200).await?;
        if window.is_empty() {
            return Ok(());
        }

        let bars: Vec<_> = window.iter().map(|c| c.bar.clone()).collect();
        let indicators = self.indicator_engine.compute(&bars);

        let last_index = window.len() - 1;
        window[last_index].indicators = indicators;

        let signals = self.signal_engine.detect(&window);
        window[last_index].signals = signals;

        self.store.save_candle(&window[last_index]).await
    }
}
