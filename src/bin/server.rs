//! Composition root. Loads config, wires the candle store, exchange
//! adapter, indicator/signal engines, ingestion pipeline and alert
//! evaluator together, spawns every periodic task, and waits on
//! `ctrl_c` for graceful shutdown. Grounded directly on `bin/server.rs` in
//! the teacher codebase.

use std::sync::Arc;

use candela::config::{Config, Exchange};
use candela::domain::market::{Symbol, Timeframe};
use candela::indicators::IndicatorEngine;
use candela::infrastructure::persistence::{Database, SqliteAlertRegistry, SqliteCandleRepository};
use candela::infrastructure::{BinanceAdapter, MockAdapter, WebhookDispatcher};
use candela::ingestion::IngestionPipeline;
use candela::alerting::AlertEvaluator;
use candela::scheduler::PeriodicTask;
use candela::signals::SignalEngine;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting candela");

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url).await?;

    let store: Arc<dyn candela::domain::ports::CandleStore> =
        Arc::new(SqliteCandleRepository::new(db.clone()));
    let registry: Arc<dyn candela::domain::ports::AlertRegistry> =
        Arc::new(SqliteAlertRegistry::new(db.clone()));
    let dispatcher: Arc<dyn candela::domain::ports::NotificationDispatcher> =
        Arc::new(WebhookDispatcher::new());

    let adapter: Arc<dyn candela::domain::ports::ExchangeAdapter> = match config.exchange {
        Exchange::Binance => Arc::new(BinanceAdapter::new(config.exchange_rate_limit_ms)?),
        Exchange::Mock => Arc::new(MockAdapter),
    };

    let symbols = Symbol::all().to_vec();
    let timeframes = Timeframe::all().to_vec();

    let pipeline = Arc::new(IngestionPipeline::new(
        adapter,
        store.clone(),
        IndicatorEngine::new(config.indicators),
        SignalEngine::new(config.thresholds),
    ));

    tracing::info!("running initial backfill");
    pipeline.backfill(&symbols, &timeframes, config.backfill_bars).await;

    let evaluator = Arc::new(AlertEvaluator::new(registry, store.clone(), dispatcher));

    let cancellation = CancellationToken::new();

    let ingestion_handle = {
        let pipeline = pipeline.clone();
        let symbols = symbols.clone();
        let timeframes = timeframes.clone();
        let tick_bars = config.tick_bars;
        let task = PeriodicTask::new("ingestion", config.ingestion_interval, cancellation.clone());
        tokio::spawn(async move {
            task.run(|| pipeline.tick(&symbols, &timeframes, tick_bars)).await;
        })
    };

    let alert_handle = {
        let task = PeriodicTask::new("alert-eval", config.alert_eval_interval, cancellation.clone());
        tokio::spawn(async move {
            task.run(|| evaluator.tick()).await;
        })
    };

    let retention_handle = {
        let store = store.clone();
        let timeframes = timeframes.clone();
        let max_age_days = config.retention_max_age_days;
        let task = PeriodicTask::new("retention", config.retention_interval, cancellation.clone());
        tokio::spawn(async move {
            task.run(|| retention_sweep(&store, &timeframes, max_age_days)).await;
        })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, exiting");
    cancellation.cancel();

    let _ = tokio::join!(ingestion_handle, alert_handle, retention_handle);
    Ok(())
}

async fn retention_sweep(
    store: &Arc<dyn candela::domain::ports::CandleStore>,
    timeframes: &[Timeframe],
    max_age_days: i64,
) {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(max_age_days)).timestamp_millis();
    for &timeframe in timeframes {
        if !timeframe.is_retention_eligible() {
            continue;
        }
        match store.delete_before(timeframe, cutoff).await {
            Ok(deleted) => tracing::info!(%timeframe, deleted, "retention sweep completed"),
            Err(e) => tracing::error!(%timeframe, error = %e, "retention sweep failed"),
        }
    }
}
