//! Schema-on-init SQLite pool, grounded directly on
//! `infrastructure/persistence/database.rs` in the teacher codebase: WAL
//! journal mode, `create_if_missing`, parent-directory creation, and a set
//! of `CREATE TABLE IF NOT EXISTS` statements run once at startup.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::domain::errors::AppResult;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> AppResult<Self> {
        if let Some(path) = db_url.strip_prefix("sqlite://") {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;

        let db = Self { pool };
        db.init().await?;
        tracing::info!(db_url, "connected to candle store");
        Ok(db)
    }

    async fn init(&self) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candles (
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                bar_open_time INTEGER NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume REAL NOT NULL,
                ma5 REAL,
                ma10 REAL,
                ma20 REAL,
                ma50 REAL,
                rsi14 REAL,
                macd_line REAL,
                macd_signal REAL,
                macd_hist REAL,
                stoch_k REAL,
                stoch_d REAL,
                bb_upper REAL,
                bb_middle REAL,
                bb_lower REAL,
                cci20 REAL,
                kdj_k REAL,
                kdj_d REAL,
                kdj_j REAL,
                skdj_k REAL,
                skdj_d REAL,
                signals TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (symbol, timeframe, bar_open_time)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_candles_open_time ON candles (bar_open_time)")
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_candles_symbol_timeframe_time \
             ON candles (symbol, timeframe, bar_open_time DESC)",
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_rules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                predicate TEXT NOT NULL,
                frequency TEXT NOT NULL,
                webhook_url TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                trigger_count INTEGER NOT NULL DEFAULT 0,
                last_triggered_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alert_rules_symbol ON alert_rules (symbol, is_active)")
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_history (
                id TEXT PRIMARY KEY,
                rule_id TEXT NOT NULL,
                triggered_at INTEGER NOT NULL,
                outcome TEXT NOT NULL,
                webhook_response TEXT
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alert_history_rule ON alert_history (rule_id, triggered_at)")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
