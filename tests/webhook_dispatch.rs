//! Exercises `WebhookDispatcher` against a real in-process HTTP server
//! (an `axum` stub standing in for the external alert receiver, since no
//! `wiremock`-style crate is in the teacher's own stack) instead of only
//! unit-testing the truncation helper.

use std::collections::BTreeSet;
use std::net::SocketAddr;

use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use candela::domain::alert::{AlertFrequency, AlertRule};
use candela::domain::candle::{Bar, Candle};
use candela::domain::market::{Symbol, Timeframe};
use candela::domain::ports::NotificationDispatcher;
use candela::domain::query::{Operator, Predicate, PredicateNode, PredicateValue, QueryField, Scalar};
use candela::infrastructure::WebhookDispatcher;
use rust_decimal::Decimal;

async fn spawn_webhook_server(reply: Value, status: axum::http::StatusCode) -> SocketAddr {
    let app = Router::new().route(
        "/webhook/alert/trigger",
        post(move || {
            let reply = reply.clone();
            async move { (status, Json(reply)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sample_rule(webhook_url: String) -> AlertRule {
    let predicate = PredicateNode::leaf(
        Predicate::new(QueryField::Rsi14, Operator::Lt, PredicateValue::Scalar(Scalar::Number(30.0))).unwrap(),
    );
    AlertRule {
        id: uuid::Uuid::new_v4(),
        name: "test rule".into(),
        symbol: Symbol::Btc,
        timeframe: Timeframe::FiveMin,
        predicate,
        frequency: AlertFrequency::EveryTime,
        webhook_url,
        is_active: true,
        trigger_count: 0,
        last_triggered_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_candle() -> Candle {
    let bar = Bar {
        symbol: Symbol::Btc,
        timeframe: Timeframe::FiveMin,
        open_time: Utc::now(),
        open: Decimal::from(100),
        high: Decimal::from(105),
        low: Decimal::from(95),
        close: Decimal::from(102),
        volume: Decimal::from(10),
    };
    Candle {
        bar,
        indicators: candela::domain::candle::Indicators::default(),
        signals: BTreeSet::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn dispatch_classifies_a_successful_2xx_response_as_sent() {
    let addr = spawn_webhook_server(json!({ "success": true }), axum::http::StatusCode::OK).await;
    let dispatcher = WebhookDispatcher::new();
    let rule = sample_rule(format!("http://{addr}/webhook/alert/trigger"));

    let (outcome, response) = dispatcher.dispatch(&rule, &sample_candle()).await;

    assert_eq!(outcome, candela::domain::alert::DispatchOutcome::Sent);
    assert!(response.unwrap().contains("true"));
}

#[tokio::test]
async fn dispatch_classifies_a_500_response_as_not_sent_but_still_returns_the_body() {
    let addr = spawn_webhook_server(
        json!({ "success": false, "error": "boom" }),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;
    let dispatcher = WebhookDispatcher::new();
    let rule = sample_rule(format!("http://{addr}/webhook/alert/trigger"));

    let (outcome, response) = dispatcher.dispatch(&rule, &sample_candle()).await;

    assert_eq!(outcome, candela::domain::alert::DispatchOutcome::NotSent);
    assert!(response.unwrap().contains("boom"));
}

#[tokio::test]
async fn dispatch_classifies_a_2xx_with_success_false_as_not_sent() {
    let addr = spawn_webhook_server(json!({ "success": false }), axum::http::StatusCode::OK).await;
    let dispatcher = WebhookDispatcher::new();
    let rule = sample_rule(format!("http://{addr}/webhook/alert/trigger"));

    let (outcome, _response) = dispatcher.dispatch(&rule, &sample_candle()).await;

    assert_eq!(outcome, candela::domain::alert::DispatchOutcome::NotSent);
}
