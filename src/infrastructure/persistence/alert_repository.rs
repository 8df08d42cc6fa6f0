//! `sqlx`-backed `AlertRegistry`, grounded on the teacher's
//! repository-trait pattern (`domain/repositories.rs` plus
//! `infrastructure/persistence/repositories/*.rs`). The predicate tree is
//! round-tripped through `serde_json` since SQLite has no native
//! recursive-structure column type.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::alert::{
    AlertFrequency, AlertRule, AlertRuleUpdate, AlertStats, DispatchOutcome, TriggerHistory,
};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::market::{Symbol, Timeframe};
use crate::domain::ports::AlertRegistry;
use crate::domain::query::PredicateNode;
use crate::infrastructure::persistence::database::Database;

pub struct SqliteAlertRegistry {
    db: Database,
}

impl SqliteAlertRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn frequency_to_str(frequency: AlertFrequency) -> &'static str {
    match frequency {
        AlertFrequency::Once => "once",
        AlertFrequency::EveryTime => "every_time",
        AlertFrequency::Hourly => "hourly",
        AlertFrequency::Daily => "daily",
    }
}

fn frequency_from_str(s: &str) -> AppResult<AlertFrequency> {
    match s {
        "once" => Ok(AlertFrequency::Once),
        "every_time" => Ok(AlertFrequency::EveryTime),
        "hourly" => Ok(AlertFrequency::Hourly),
        "daily" => Ok(AlertFrequency::Daily),
        other => Err(AppError::Store(format!("corrupt frequency column: {other}"))),
    }
}

fn millis_to_datetime(millis: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::Store(format!("invalid timestamp: {millis}")))
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> AppResult<AlertRule> {
    let id: String = row.try_get("id")?;
    let symbol: String = row.try_get("symbol")?;
    let timeframe: String = row.try_get("timeframe")?;
    let predicate_json: String = row.try_get("predicate")?;
    let frequency: String = row.try_get("frequency")?;
    let is_active: i64 = row.try_get("is_active")?;
    let trigger_count: i64 = row.try_get("trigger_count")?;
    let last_triggered_at: Option<i64> = row.try_get("last_triggered_at")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(AlertRule {
        id: Uuid::parse_str(&id).map_err(|e| AppError::Store(e.to_string()))?,
        name: row.try_get("name")?,
        symbol: symbol.parse::<Symbol>()?,
        timeframe: timeframe.parse::<Timeframe>()?,
        predicate: serde_json::from_str::<PredicateNode>(&predicate_json)
            .map_err(|e| AppError::Store(e.to_string()))?,
        frequency: frequency_from_str(&frequency)?,
        webhook_url: row.try_get("webhook_url")?,
        is_active: is_active != 0,
        trigger_count: trigger_count as u64,
        last_triggered_at: last_triggered_at.map(millis_to_datetime).transpose()?,
        created_at: millis_to_datetime(created_at)?,
        updated_at: millis_to_datetime(updated_at)?,
    })
}

#[async_trait]
impl AlertRegistry for SqliteAlertRegistry {
    async fn create(&self, rule: AlertRule) -> AppResult<AlertRule> {
        let predicate_json = serde_json::to_string(&rule.predicate).map_err(|e| AppError::Internal(e.to_string()))?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO alert_rules
                (id, name, symbol, timeframe, predicate, frequency, webhook_url,
                 is_active, trigger_count, last_triggered_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9, ?9)
            "#,
        )
        .bind(rule.id.to_string())
        .bind(&rule.name)
        .bind(rule.symbol.as_str())
        .bind(rule.timeframe.as_str())
        .bind(predicate_json)
        .bind(frequency_to_str(rule.frequency))
        .bind(&rule.webhook_url)
        .bind(rule.is_active as i64)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get(rule.id).await
    }

    async fn update(&self, id: Uuid, update: AlertRuleUpdate) -> AppResult<AlertRule> {
        let mut rule = self.get(id).await?;
        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(predicate) = update.predicate {
            rule.predicate = predicate;
        }
        if let Some(frequency) = update.frequency {
            rule.frequency = frequency;
        }
        if let Some(webhook_url) = update.webhook_url {
            rule.webhook_url = webhook_url;
        }
        if let Some(is_active) = update.is_active {
            rule.is_active = is_active;
        }

        let predicate_json = serde_json::to_string(&rule.predicate).map_err(|e| AppError::Internal(e.to_string()))?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            UPDATE alert_rules SET
                name = ?1, predicate = ?2, frequency = ?3, webhook_url = ?4,
                is_active = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&rule.name)
        .bind(predicate_json)
        .bind(frequency_to_str(rule.frequency))
        .bind(&rule.webhook_url)
        .bind(rule.is_active as i64)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.db.pool)
        .await?;

        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM alert_rules WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.db.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("alert rule {id}")));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<AlertRule> {
        let row = sqlx::query("SELECT * FROM alert_rules WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("alert rule {id}")))?;
        row_to_rule(&row)
    }

    async fn list(&self, symbol: Option<Symbol>, active_only: bool, limit: usize) -> AppResult<Vec<AlertRule>> {
        let rows = match symbol {
            Some(symbol) if active_only => {
                sqlx::query(
                    "SELECT * FROM alert_rules WHERE symbol = ?1 AND is_active = 1 ORDER BY created_at DESC LIMIT ?2",
                )
                .bind(symbol.as_str())
                .bind(limit as i64)
                .fetch_all(&self.db.pool)
                .await?
            }
            Some(symbol) => {
                sqlx::query("SELECT * FROM alert_rules WHERE symbol = ?1 ORDER BY created_at DESC LIMIT ?2")
                    .bind(symbol.as_str())
                    .bind(limit as i64)
                    .fetch_all(&self.db.pool)
                    .await?
            }
            None if active_only => {
                sqlx::query("SELECT * FROM alert_rules WHERE is_active = 1 ORDER BY created_at DESC LIMIT ?1")
                    .bind(limit as i64)
                    .fetch_all(&self.db.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM alert_rules ORDER BY created_at DESC LIMIT ?1")
                    .bind(limit as i64)
                    .fetch_all(&self.db.pool)
                    .await?
            }
        };
        rows.iter().map(row_to_rule).collect()
    }

    async fn list_active(&self) -> AppResult<Vec<AlertRule>> {
        self.list(None, true, 10_000).await
    }

    async fn record_trigger(&self, id: Uuid, history: TriggerHistory) -> AppResult<()> {
        let outcome_str = match history.outcome {
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::NotSent => "not_sent",
        };

        sqlx::query(
            "INSERT INTO alert_history (id, rule_id, triggered_at, outcome, webhook_response) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(history.id.to_string())
        .bind(history.rule_id.to_string())
        .bind(history.triggered_at.timestamp_millis())
        .bind(outcome_str)
        .bind(&history.webhook_response)
        .execute(&self.db.pool)
        .await?;

        // I5/I6: the trigger bookkeeping update is one atomic UPDATE so
        // concurrent rule evaluations never race on the same row.
        sqlx::query(
            "UPDATE alert_rules SET trigger_count = trigger_count + 1, last_triggered_at = ?1, updated_at = ?1 \
             WHERE id = ?2",
        )
        .bind(history.triggered_at.timestamp_millis())
        .bind(id.to_string())
        .execute(&self.db.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> AppResult<AlertStats> {
        let total_rules: i64 = sqlx::query("SELECT COUNT(*) AS c FROM alert_rules")
            .fetch_one(&self.db.pool)
            .await?
            .try_get("c")?;
        let active_rules: i64 = sqlx::query("SELECT COUNT(*) AS c FROM alert_rules WHERE is_active = 1")
            .fetch_one(&self.db.pool)
            .await?
            .try_get("c")?;

        let day_ago = (Utc::now() - chrono::Duration::days(1)).timestamp_millis();
        let hour_ago = (Utc::now() - chrono::Duration::hours(1)).timestamp_millis();

        let triggers_today: i64 = sqlx::query("SELECT COUNT(*) AS c FROM alert_history WHERE triggered_at >= ?1")
            .bind(day_ago)
            .fetch_one(&self.db.pool)
            .await?
            .try_get("c")?;
        let triggers_this_hour: i64 = sqlx::query("SELECT COUNT(*) AS c FROM alert_history WHERE triggered_at >= ?1")
            .bind(hour_ago)
            .fetch_one(&self.db.pool)
            .await?
            .try_get("c")?;
        let sent_today: i64 =
            sqlx::query("SELECT COUNT(*) AS c FROM alert_history WHERE triggered_at >= ?1 AND outcome = 'sent'")
                .bind(day_ago)
                .fetch_one(&self.db.pool)
                .await?
                .try_get("c")?;

        let success_rate = if triggers_today > 0 {
            sent_today as f64 / triggers_today as f64
        } else {
            0.0
        };

        let last_check: Option<i64> = sqlx::query("SELECT MAX(triggered_at) AS m FROM alert_history")
            .fetch_one(&self.db.pool)
            .await?
            .try_get("m")?;

        Ok(AlertStats {
            total_rules: total_rules as u64,
            active_rules: active_rules as u64,
            triggers_today: triggers_today as u64,
            triggers_this_hour: triggers_this_hour as u64,
            success_rate,
            last_check: last_check.map(millis_to_datetime).transpose()?,
        })
    }
}
