//! Exercises the full ingestion -> indicator -> signal -> query -> alert
//! chain against a temp SQLite file, using `MockAdapter` so no network
//! calls are made.

use std::sync::Arc;

use candela::domain::market::{Symbol, Timeframe};
use candela::domain::ports::{AlertRegistry, CandleStore, ExchangeAdapter};
use candela::domain::query::{LogicalOp, Operator, Predicate, PredicateNode, PredicateValue, QueryField, Scalar};
use candela::indicators::{IndicatorConfig, IndicatorEngine};
use candela::infrastructure::persistence::{Database, SqliteAlertRegistry, SqliteCandleRepository};
use candela::infrastructure::MockAdapter;
use candela::ingestion::IngestionPipeline;
use candela::signals::{SignalEngine, SignalThresholds};

async fn temp_database() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("candela.db");
    let db = Database::new(&format!("sqlite://{}", db_path.display())).await.unwrap();
    (db, dir)
}

#[tokio::test]
async fn backfill_computes_indicators_once_warmed_up() {
    let (db, _guard) = temp_database().await;
    let store: Arc<dyn CandleStore> = Arc::new(SqliteCandleRepository::new(db));
    let adapter: Arc<dyn ExchangeAdapter> = Arc::new(MockAdapter);

    let pipeline = IngestionPipeline::new(
        adapter,
        store.clone(),
        IndicatorEngine::new(IndicatorConfig::default()),
        SignalEngine::new(SignalThresholds::default()),
    );

    pipeline.backfill(&[Symbol::Btc], &[Timeframe::FiveMin], 60).await;

    let window = store.load_window(Symbol::Btc, Timeframe::FiveMin, 200).await.unwrap();
    assert_eq!(window.len(), 60);

    let latest = window.last().unwrap();
    assert!(latest.indicators.ma5.is_some());
    assert!(latest.indicators.rsi14.is_some());
    assert!(latest.indicators.kdj_k.is_some());
}

#[tokio::test]
async fn tick_only_inserts_genuinely_new_bars() {
    let (db, _guard) = temp_database().await;
    let store: Arc<dyn CandleStore> = Arc::new(SqliteCandleRepository::new(db));
    let adapter: Arc<dyn ExchangeAdapter> = Arc::new(MockAdapter);

    let pipeline = IngestionPipeline::new(
        adapter,
        store.clone(),
        IndicatorEngine::new(IndicatorConfig::default()),
        SignalEngine::new(SignalThresholds::default()),
    );

    pipeline.backfill(&[Symbol::Btc], &[Timeframe::FiveMin], 60).await;
    let after_backfill = store.load_window(Symbol::Btc, Timeframe::FiveMin, 200).await.unwrap().len();

    pipeline.tick(&[Symbol::Btc], &[Timeframe::FiveMin], 5).await;
    let after_tick = store.load_window(Symbol::Btc, Timeframe::FiveMin, 200).await.unwrap().len();

    assert!(after_tick >= after_backfill);
}

#[tokio::test]
async fn query_engine_filters_via_predicate_tree() {
    let (db, _guard) = temp_database().await;
    let store: Arc<dyn CandleStore> = Arc::new(SqliteCandleRepository::new(db));
    let adapter: Arc<dyn ExchangeAdapter> = Arc::new(MockAdapter);

    let pipeline = IngestionPipeline::new(
        adapter,
        store.clone(),
        IndicatorEngine::new(IndicatorConfig::default()),
        SignalEngine::new(SignalThresholds::default()),
    );
    pipeline.backfill(&[Symbol::Eth], &[Timeframe::FiveMin], 60).await;

    let window = store.load_window(Symbol::Eth, Timeframe::FiveMin, 200).await.unwrap();

    let predicate = PredicateNode::logical(
        LogicalOp::And,
        vec![
            PredicateNode::leaf(
                Predicate::new(
                    QueryField::Close,
                    Operator::Gt,
                    PredicateValue::Scalar(Scalar::Number(0.0)),
                )
                .unwrap(),
            ),
            PredicateNode::leaf(
                Predicate::new(
                    QueryField::Volume,
                    Operator::Gte,
                    PredicateValue::Scalar(Scalar::Number(0.0)),
                )
                .unwrap(),
            ),
        ],
    )
    .unwrap();

    let result = candela::query::QueryEngine::run(&predicate, window, 100);
    assert_eq!(result.total_records, 60);
    assert_eq!(result.matched_records, 60);
}

#[tokio::test]
async fn alert_rule_lifecycle_persists_through_sqlite() {
    let (db, _guard) = temp_database().await;
    let registry = SqliteAlertRegistry::new(db);

    let predicate = PredicateNode::leaf(
        Predicate::new(
            QueryField::Rsi14,
            Operator::Lt,
            PredicateValue::Scalar(Scalar::Number(30.0)),
        )
        .unwrap(),
    );

    let rule = candela::domain::alert::AlertRule {
        id: uuid::Uuid::new_v4(),
        name: "btc rsi oversold".into(),
        symbol: Symbol::Btc,
        timeframe: Timeframe::FiveMin,
        predicate,
        frequency: candela::domain::alert::AlertFrequency::Once,
        webhook_url: "https://example.test/hook".into(),
        is_active: true,
        trigger_count: 0,
        last_triggered_at: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let created = registry.create(rule).await.unwrap();
    let fetched = registry.get(created.id).await.unwrap();
    assert_eq!(fetched.name, "btc rsi oversold");

    let active = registry.list_active().await.unwrap();
    assert_eq!(active.len(), 1);

    registry.delete(created.id).await.unwrap();
    assert!(registry.get(created.id).await.is_err());
}
