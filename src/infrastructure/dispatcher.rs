//! C9: the notification dispatcher. Builds the trigger envelope from
//! spec.md §4.8, POSTs it with a 30s-timeout `reqwest` client, and
//! classifies the outcome. Dispatch never blocks the rule's bookkeeping
//! update (§7, I6) — the caller records the outcome after this returns.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::domain::alert::{AlertRule, DispatchOutcome};
use crate::domain::candle::Candle;
use crate::domain::ports::NotificationDispatcher;

const RESPONSE_TRUNCATE_LEN: usize = 500;

#[derive(Debug, Serialize)]
struct TriggerEnvelope {
    alert_type: &'static str,
    rule_id: String,
    rule_name: String,
    symbol: String,
    timeframe: String,
    triggered_at: String,
    detected_signals: Vec<String>,
    data: TriggerData,
}

#[derive(Debug, Serialize)]
struct TriggerData {
    close: String,
    rsi14: Option<f64>,
    macd_line: Option<f64>,
    kdj_j: Option<f64>,
}

pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builder never fails with a static config");
        Self { client }
    }
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn dispatch(&self, rule: &AlertRule, candle: &Candle) -> (DispatchOutcome, Option<String>) {
        let envelope = TriggerEnvelope {
            alert_type: "technical_signal",
            rule_id: rule.id.to_string(),
            rule_name: rule.name.clone(),
            symbol: rule.symbol.to_string(),
            timeframe: rule.timeframe.to_string(),
            triggered_at: Utc::now().to_rfc3339(),
            detected_signals: candle.signals.iter().map(|t| t.to_string()).collect(),
            data: TriggerData {
                close: candle.bar.close.to_string(),
                rsi14: candle.indicators.rsi14,
                macd_line: candle.indicators.macd_line,
                kdj_j: candle.indicators.kdj_j,
            },
        };

        let response = match self.client.post(&rule.webhook_url).json(&envelope).send().await {
            Ok(response) => response,
            Err(e) => return (DispatchOutcome::NotSent, Some(truncate(&e.to_string()))),
        };

        let status_ok = response.status().is_success();
        let body_text = match response.text().await {
            Ok(text) => text,
            Err(e) => return (DispatchOutcome::NotSent, Some(truncate(&e.to_string()))),
        };

        if !status_ok {
            return (DispatchOutcome::NotSent, Some(truncate(&body_text)));
        }

        let parsed: Result<Value, _> = serde_json::from_str(&body_text);
        match parsed {
            Ok(value) if value.get("success").and_then(Value::as_bool) == Some(true) => {
                (DispatchOutcome::Sent, Some(truncate(&body_text)))
            }
            _ => (DispatchOutcome::NotSent, Some(truncate(&body_text))),
        }
    }
}

fn truncate(s: &str) -> String {
    if s.len() <= RESPONSE_TRUNCATE_LEN {
        s.to_string()
    } else {
        s.chars().take(RESPONSE_TRUNCATE_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_responses_to_the_configured_limit() {
        let long = "x".repeat(1000);
        assert_eq!(truncate(&long).len(), RESPONSE_TRUNCATE_LEN);
    }

    #[test]
    fn leaves_short_responses_untouched() {
        assert_eq!(truncate("ok"), "ok");
    }
}
