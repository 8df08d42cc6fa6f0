//! Alert rule and trigger-history record types (spec.md §4.7/§4.8). Grounded
//! on `original_source/alerts/alert_manager.py`'s rule lifecycle and on the
//! teacher's repository-backed record style (`domain/trading/types.rs`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::market::{Symbol, Timeframe};
use crate::domain::query::PredicateNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFrequency {
    Once,
    EveryTime,
    Hourly,
    Daily,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub id: Uuid,
    pub name: String,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub predicate: PredicateNode,
    pub frequency: AlertFrequency,
    pub webhook_url: String,
    pub is_active: bool,
    pub trigger_count: u64,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every field optional so a caller can PATCH just the fields they mean to
/// change; the wire DTO this is built from rejects unknown keys outright
/// rather than silently dropping them.
#[derive(Debug, Clone, Default)]
pub struct AlertRuleUpdate {
    pub name: Option<String>,
    pub predicate: Option<PredicateNode>,
    pub frequency: Option<AlertFrequency>,
    pub webhook_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    NotSent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerHistory {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub triggered_at: DateTime<Utc>,
    pub outcome: DispatchOutcome,
    pub webhook_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertStats {
    pub total_rules: u64,
    pub active_rules: u64,
    pub triggers_today: u64,
    pub triggers_this_hour: u64,
    pub success_rate: f64,
    pub last_check: Option<DateTime<Utc>>,
}

impl AlertRule {
    /// spec.md §4.7: `once` rules self-disable after their first trigger;
    /// `every_time` always re-fires; `hourly`/`daily` gate on elapsed time
    /// since the last trigger. `is_active` is left untouched here — the
    /// evaluator never flips it (O4).
    pub fn should_check(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.frequency {
            AlertFrequency::Once => self.trigger_count == 0,
            AlertFrequency::EveryTime => true,
            AlertFrequency::Hourly => match self.last_triggered_at {
                Some(last) => now - last >= chrono::Duration::hours(1),
                None => true,
            },
            AlertFrequency::Daily => match self.last_triggered_at {
                Some(last) => now - last >= chrono::Duration::days(1),
                None => true,
            },
        }
    }
}
