//! C8: the alert evaluator. One periodic tick loads active rules, filters
//! by `should_check`, and fans the rest out concurrently via
//! `FuturesUnordered`, grounded on the per-symbol concurrent dispatch in
//! `application/system.rs` in the teacher codebase. A panic or error inside
//! one rule's evaluation is caught at the per-rule boundary and logged; it
//! never aborts the tick.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use uuid::Uuid;

use crate::domain::alert::{AlertRule, DispatchOutcome, TriggerHistory};
use crate::domain::errors::AppResult;
use crate::domain::ports::{AlertRegistry, CandleStore, NotificationDispatcher};
use crate::logging::generate_request_id;
use crate::query::QueryEngine;
use tracing::Instrument;

pub struct AlertEvaluator {
    registry: Arc<dyn AlertRegistry>,
    store: Arc<dyn CandleStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AlertEvaluator {
    pub fn new(
        registry: Arc<dyn AlertRegistry>,
        store: Arc<dyn CandleStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            registry,
            store,
            dispatcher,
        }
    }

    pub async fn tick(&self) {
        let request_id = generate_request_id();
        let span = tracing::info_span!("alert_tick", request_id = %request_id);
        async {
            let rules = match self.registry.list_active().await {
                Ok(rules) => rules,
                Err(e) => {
                    tracing::error!(error = %e, "failed to load active alert rules");
                    return;
                }
            };

            let now = Utc::now();
            let due: Vec<AlertRule> = rules.into_iter().filter(|rule| rule.should_check(now)).collect();
            tracing::debug!(due = due.len(), "alert evaluation tick");

            let mut in_flight: FuturesUnordered<_> =
                due.into_iter().map(|rule| self.evaluate_rule(rule)).collect();
            while let Some(result) = in_flight.next().await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "rule evaluation failed");
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn evaluate_rule(&self, rule: AlertRule) -> AppResult<()> {
        let window = self.store.load_window(rule.symbol, rule.timeframe, 200).await?;
        let Some(candle) = window.last().cloned() else {
            return Ok(());
        };

        let result = QueryEngine::run(&rule.predicate, vec![candle.clone()], 1);
        if result.matched_records == 0 {
            return Ok(());
        }

        let (outcome, response) = self.dispatcher.dispatch(&rule, &candle).await;
        if matches!(outcome, DispatchOutcome::NotSent) {
            tracing::warn!(rule_id = %rule.id, "webhook dispatch failed");
        }

        let history = TriggerHistory {
            id: Uuid::new_v4(),
            rule_id: rule.id,
            triggered_at: Utc::now(),
            outcome,
            webhook_response: response,
        };
        self.registry.record_trigger(rule.id, history).await
    }
}
