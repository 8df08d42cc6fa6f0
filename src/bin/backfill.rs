//! One-shot cold-start entry point: runs `IngestionPipeline::backfill()`
//! once against every configured symbol/timeframe pair and exits.

use std::sync::Arc;

use candela::config::{Config, Exchange};
use candela::domain::market::{Symbol, Timeframe};
use candela::indicators::IndicatorEngine;
use candela::infrastructure::persistence::{Database, SqliteCandleRepository};
use candela::infrastructure::{BinanceAdapter, MockAdapter};
use candela::ingestion::IngestionPipeline;
use candela::signals::SignalEngine;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url).await?;
    let store: Arc<dyn candela::domain::ports::CandleStore> = Arc::new(SqliteCandleRepository::new(db));

    let adapter: Arc<dyn candela::domain::ports::ExchangeAdapter> = match config.exchange {
        Exchange::Binance => Arc::new(BinanceAdapter::new(config.exchange_rate_limit_ms)?),
        Exchange::Mock => Arc::new(MockAdapter),
    };

    let pipeline = IngestionPipeline::new(
        adapter,
        store,
        IndicatorEngine::new(config.indicators),
        SignalEngine::new(config.thresholds),
    );

    let symbols = Symbol::all();
    let timeframes = Timeframe::all();
    tracing::info!(bars = config.backfill_bars, "starting backfill");
    pipeline.backfill(symbols, timeframes, config.backfill_bars).await;
    tracing::info!("backfill complete");

    Ok(())
}
