//! Compiles and evaluates a `PredicateNode` against an in-memory candle
//! window. SQLite's query planner is used only for the symbol/timeframe/
//! time-range prefilter upstream of this; the predicate tree itself is
//! evaluated here in Rust per row, grounded on
//! `original_source/alerts/query_engine.py::_build_condition_query`, so
//! null-handling (I8) and `signals` set membership stay exactly
//! spec-compliant instead of fighting SQL's three-valued `NULL` logic.

use chrono::Utc;

use crate::domain::candle::Candle;
use crate::domain::query::{LogicalOp, Operator, Predicate, PredicateNode, PredicateValue, QueryField, Scalar};

/// I8: a predicate over a field that is currently `None` never matches,
/// regardless of operator.
pub fn evaluate(node: &PredicateNode, candle: &Candle) -> bool {
    match node {
        PredicateNode::Leaf(predicate) => evaluate_leaf(predicate, candle),
        PredicateNode::Logical(LogicalOp::And, children) => children.iter().all(|c| evaluate(c, candle)),
        PredicateNode::Logical(LogicalOp::Or, children) => children.iter().any(|c| evaluate(c, candle)),
        PredicateNode::Logical(LogicalOp::Not, children) => {
            !evaluate(&children[0], candle)
        }
    }
}

pub(crate) fn field_value(field: QueryField, candle: &Candle) -> Option<f64> {
    use QueryField::*;
    match field {
        Close => Some(candle.close_f64()),
        Open => candle.bar.open.to_string().parse().ok(),
        High => candle.bar.high.to_string().parse().ok(),
        Low => candle.bar.low.to_string().parse().ok(),
        Volume => candle.bar.volume.to_string().parse().ok(),
        Rsi14 => candle.indicators.rsi14,
        MacdLine => candle.indicators.macd_line,
        MacdSignal => candle.indicators.macd_signal,
        MacdHist => candle.indicators.macd_hist,
        Ma5 => candle.indicators.ma5,
        Ma10 => candle.indicators.ma10,
        Ma20 => candle.indicators.ma20,
        Ma50 => candle.indicators.ma50,
        StochK => candle.indicators.stoch_k,
        StochD => candle.indicators.stoch_d,
        BbUpper => candle.indicators.bb_upper,
        BbMiddle => candle.indicators.bb_middle,
        BbLower => candle.indicators.bb_lower,
        Cci20 => candle.indicators.cci20,
        KdjK => candle.indicators.kdj_k,
        KdjD => candle.indicators.kdj_d,
        KdjJ => candle.indicators.kdj_j,
        OpenTime => Some(candle.bar.open_time.timestamp() as f64),
        Signals => None,
    }
}

fn scalar_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Number(n) => Some(*n),
        Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Scalar::Text(_) => None,
    }
}

fn evaluate_leaf(predicate: &Predicate, candle: &Candle) -> bool {
    if predicate.field == QueryField::Signals {
        return evaluate_signals(predicate, candle);
    }
    if predicate.operator == Operator::Before || predicate.operator == Operator::After {
        return evaluate_time_bound(predicate, candle);
    }
    if predicate.operator == Operator::WithinLast {
        return evaluate_within_last(predicate, candle);
    }

    let Some(actual) = field_value(predicate.field, candle) else {
        return false;
    };

    match (&predicate.operator, &predicate.value) {
        (Operator::Eq, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| (actual - v).abs() < f64::EPSILON),
        (Operator::Ne, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| (actual - v).abs() >= f64::EPSILON),
        (Operator::Gt, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| actual > v),
        (Operator::Gte, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| actual >= v),
        (Operator::Lt, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| actual < v),
        (Operator::Lte, PredicateValue::Scalar(s)) => scalar_f64(s).is_some_and(|v| actual <= v),
        (Operator::Between, PredicateValue::List(values)) if values.len() == 2 => {
            match (scalar_f64(&values[0]), scalar_f64(&values[1])) {
                (Some(lo), Some(hi)) => actual >= lo && actual <= hi,
                _ => false,
            }
        }
        (Operator::In, PredicateValue::List(values)) => values
            .iter()
            .filter_map(scalar_f64)
            .any(|v| (actual - v).abs() < f64::EPSILON),
        (Operator::NotIn, PredicateValue::List(values)) => !values
            .iter()
            .filter_map(scalar_f64)
            .any(|v| (actual - v).abs() < f64::EPSILON),
        _ => false,
    }
}

/// `contains`/`not_contains` against the signals field accept either a bare
/// tag string or a list of tags; a list matches on set-intersection (any
/// listed tag present in the candle's signal set), per S1.
fn evaluate_signals(predicate: &Predicate, candle: &Candle) -> bool {
    let present: Vec<String> = candle.signals.iter().map(|t| t.to_string()).collect();

    let tags_of = |value: &PredicateValue| -> Vec<String> {
        match value {
            PredicateValue::Scalar(Scalar::Text(tag)) => vec![tag.clone()],
            PredicateValue::List(values) => values
                .iter()
                .filter_map(|v| match v {
                    Scalar::Text(tag) => Some(tag.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    };

    match predicate.operator {
        Operator::Contains | Operator::Eq => {
            let wanted = tags_of(&predicate.value);
            !wanted.is_empty() && wanted.iter().any(|tag| present.contains(tag))
        }
        Operator::NotContains | Operator::Ne => {
            let wanted = tags_of(&predicate.value);
            !wanted.iter().any(|tag| present.contains(tag))
        }
        Operator::StartsWith => {
            let PredicateValue::Scalar(Scalar::Text(prefix)) = &predicate.value else {
                return false;
            };
            present.iter().any(|p| p.starts_with(prefix.as_str()))
        }
        Operator::EndsWith => {
            let PredicateValue::Scalar(Scalar::Text(suffix)) = &predicate.value else {
                return false;
            };
            present.iter().any(|p| p.ends_with(suffix.as_str()))
        }
        _ => false,
    }
}

fn evaluate_time_bound(predicate: &Predicate, candle: &Candle) -> bool {
    let PredicateValue::Instant(instant) = &predicate.value else {
        return false;
    };
    match predicate.operator {
        Operator::Before => candle.bar.open_time < *instant,
        Operator::After => candle.bar.open_time > *instant,
        _ => false,
    }
}

/// O1: `within_last` is always hours, regardless of the candle's timeframe,
/// matching `_calculate_time_delta`'s unconditional `timedelta(hours=value)`.
fn evaluate_within_last(predicate: &Predicate, candle: &Candle) -> bool {
    let PredicateValue::Scalar(Scalar::Number(hours)) = &predicate.value else {
        return false;
    };
    let cutoff = Utc::now() - chrono::Duration::minutes((*hours * 60.0) as i64);
    candle.bar.open_time >= cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Bar;
    use crate::domain::market::{Symbol, Timeframe};
    use crate::domain::query::Operator;
    use rust_decimal_macros::dec;

    fn candle() -> Candle {
        let bar = Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: dec!(100),
            high: dec!(105),
            low: dec!(95),
            close: dec!(102),
            volume: dec!(10),
        };
        let mut candle = Candle::new(bar);
        candle.indicators.rsi14 = Some(25.0);
        candle
    }

    #[test]
    fn gt_matches_when_field_present() {
        let predicate = Predicate::new(
            QueryField::Rsi14,
            Operator::Lt,
            PredicateValue::Scalar(Scalar::Number(30.0)),
        )
        .unwrap();
        assert!(evaluate(&PredicateNode::leaf(predicate), &candle()));
    }

    #[test]
    fn missing_field_never_matches() {
        let predicate = Predicate::new(
            QueryField::MacdLine,
            Operator::Gt,
            PredicateValue::Scalar(Scalar::Number(0.0)),
        )
        .unwrap();
        assert!(!evaluate(&PredicateNode::leaf(predicate), &candle()));
    }

    #[test]
    fn and_requires_all_children() {
        let a = PredicateNode::leaf(
            Predicate::new(QueryField::Rsi14, Operator::Lt, PredicateValue::Scalar(Scalar::Number(30.0))).unwrap(),
        );
        let b = PredicateNode::leaf(
            Predicate::new(QueryField::Close, Operator::Gt, PredicateValue::Scalar(Scalar::Number(1000.0))).unwrap(),
        );
        let node = PredicateNode::logical(LogicalOp::And, vec![a, b]).unwrap();
        assert!(!evaluate(&node, &candle()));
    }

    #[test]
    fn contains_matches_a_list_valued_signal_predicate() {
        let mut c = candle();
        c.signals.insert(crate::domain::signal::SignalTag::MaGoldenCross);

        let predicate = Predicate::new(
            QueryField::Signals,
            Operator::Contains,
            PredicateValue::List(vec![Scalar::Text("MA_GOLDEN_CROSS".into())]),
        )
        .unwrap();
        assert!(evaluate(&PredicateNode::leaf(predicate), &c));
    }

    #[test]
    fn not_contains_excludes_when_any_listed_tag_is_present() {
        let mut c = candle();
        c.signals.insert(crate::domain::signal::SignalTag::MaGoldenCross);

        let predicate = Predicate::new(
            QueryField::Signals,
            Operator::NotContains,
            PredicateValue::List(vec![
                Scalar::Text("MA_GOLDEN_CROSS".into()),
                Scalar::Text("MA_DEATH_CROSS".into()),
            ]),
        )
        .unwrap();
        assert!(!evaluate(&PredicateNode::leaf(predicate), &c));
    }

    #[test]
    fn starts_with_matches_a_signal_tag_prefix() {
        let mut c = candle();
        c.signals.insert(crate::domain::signal::SignalTag::MaGoldenCross);

        let predicate = Predicate::new(
            QueryField::Signals,
            Operator::StartsWith,
            PredicateValue::Scalar(Scalar::Text("MA_".into())),
        )
        .unwrap();
        assert!(evaluate(&PredicateNode::leaf(predicate), &c));
    }

    #[test]
    fn ends_with_matches_a_signal_tag_suffix() {
        let mut c = candle();
        c.signals.insert(crate::domain::signal::SignalTag::MaGoldenCross);

        let predicate = Predicate::new(
            QueryField::Signals,
            Operator::EndsWith,
            PredicateValue::Scalar(Scalar::Text("_CROSS".into())),
        )
        .unwrap();
        assert!(evaluate(&PredicateNode::leaf(predicate), &c));
    }
}
