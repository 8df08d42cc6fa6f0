//! The query predicate language (spec.md §4.6, REDESIGN FLAGS). Grounded on
//! `original_source/alerts/query_engine.py`'s mongo-query builder, reshaped
//! into a closed Rust type so every condition is validated once at
//! construction rather than re-checked (or silently mis-handled) on every
//! evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{AppError, AppResult};

/// Dotted-path fields a predicate can reference, per
/// `original_source/alerts/query_engine.py::_map_field_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    Close,
    Open,
    High,
    Low,
    Volume,
    Rsi14,
    MacdLine,
    MacdSignal,
    MacdHist,
    Ma5,
    Ma10,
    Ma20,
    Ma50,
    StochK,
    StochD,
    BbUpper,
    BbMiddle,
    BbLower,
    Cci20,
    KdjK,
    KdjD,
    KdjJ,
    OpenTime,
    Signals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Before,
    After,
    WithinLast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Instant(DateTime<Utc>),
}

/// A single field/operator/value condition, validated at construction
/// (`between` needs exactly two values, `before`/`after` need a parseable
/// instant, etc).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: QueryField,
    pub operator: Operator,
    pub value: PredicateValue,
}

impl Predicate {
    pub fn new(field: QueryField, operator: Operator, value: PredicateValue) -> AppResult<Self> {
        match (operator, &value) {
            (Operator::Between, PredicateValue::List(values)) if values.len() == 2 => {}
            (Operator::Between, _) => {
                return Err(AppError::validation(
                    "between requires exactly two values",
                ));
            }
            (Operator::In, PredicateValue::List(values)) | (Operator::NotIn, PredicateValue::List(values)) => {
                if values.is_empty() {
                    return Err(AppError::validation("in/not_in requires at least one value"));
                }
            }
            (Operator::In, _) | (Operator::NotIn, _) => {
                return Err(AppError::validation("in/not_in requires a list of values"));
            }
            (Operator::Before, _) | (Operator::After, _) => {
                if !matches!(value, PredicateValue::Instant(_)) {
                    return Err(AppError::validation(
                        "before/after requires an RFC3339 instant",
                    ));
                }
            }
            (Operator::WithinLast, _) => {
                if !matches!(value, PredicateValue::Scalar(Scalar::Number(_))) {
                    return Err(AppError::validation("within_last requires a numeric hour count"));
                }
            }
            (Operator::StartsWith, _) | (Operator::EndsWith, _) => {
                if !matches!(value, PredicateValue::Scalar(Scalar::Text(_))) {
                    return Err(AppError::validation(
                        "starts_with/ends_with requires a text value",
                    ));
                }
            }
            _ => {}
        }
        Ok(Self {
            field,
            operator,
            value,
        })
    }
}

/// Boolean combinator for a predicate tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// The recursive query tree: either a leaf condition or a logical
/// combination of child nodes. `Not` is enforced to have exactly one child
/// at construction time (O2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredicateNode {
    Leaf(Predicate),
    Logical(LogicalOp, Vec<PredicateNode>),
}

impl PredicateNode {
    pub fn leaf(predicate: Predicate) -> Self {
        Self::Leaf(predicate)
    }

    pub fn logical(op: LogicalOp, children: Vec<PredicateNode>) -> AppResult<Self> {
        match op {
            LogicalOp::Not if children.len() != 1 => {
                return Err(AppError::validation("NOT requires exactly one child"));
            }
            LogicalOp::And | LogicalOp::Or if children.is_empty() => {
                return Err(AppError::validation("AND/OR requires at least one child"));
            }
            _ => {}
        }
        Ok(Self::Logical(op, children))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub symbol: Option<crate::domain::market::Symbol>,
    pub timeframe: Option<crate::domain::market::Timeframe>,
    pub predicate: PredicateNode,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub total_records: usize,
    pub matched_records: usize,
    pub candles: Vec<crate::domain::candle::Candle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_requires_exactly_two_values() {
        let one = Predicate::new(
            QueryField::Rsi14,
            Operator::Between,
            PredicateValue::List(vec![Scalar::Number(30.0)]),
        );
        assert!(one.is_err());

        let two = Predicate::new(
            QueryField::Rsi14,
            Operator::Between,
            PredicateValue::List(vec![Scalar::Number(30.0), Scalar::Number(70.0)]),
        );
        assert!(two.is_ok());
    }

    #[test]
    fn not_requires_exactly_one_child() {
        let leaf = PredicateNode::leaf(
            Predicate::new(
                QueryField::Close,
                Operator::Gt,
                PredicateValue::Scalar(Scalar::Number(1.0)),
            )
            .unwrap(),
        );

        assert!(PredicateNode::logical(LogicalOp::Not, vec![leaf.clone()]).is_ok());
        assert!(PredicateNode::logical(LogicalOp::Not, vec![leaf.clone(), leaf]).is_err());
    }

    #[test]
    fn and_or_require_at_least_one_child() {
        assert!(PredicateNode::logical(LogicalOp::And, vec![]).is_err());
        assert!(PredicateNode::logical(LogicalOp::Or, vec![]).is_err());
    }

    #[test]
    fn within_last_requires_numeric_hours() {
        let bad = Predicate::new(
            QueryField::OpenTime,
            Operator::WithinLast,
            PredicateValue::Scalar(Scalar::Text("soon".into())),
        );
        assert!(bad.is_err());

        let good = Predicate::new(
            QueryField::OpenTime,
            Operator::WithinLast,
            PredicateValue::Scalar(Scalar::Number(24.0)),
        );
        assert!(good.is_ok());
    }

    #[test]
    fn starts_with_requires_text() {
        let bad = Predicate::new(
            QueryField::Signals,
            Operator::StartsWith,
            PredicateValue::Scalar(Scalar::Number(1.0)),
        );
        assert!(bad.is_err());

        let good = Predicate::new(
            QueryField::Signals,
            Operator::StartsWith,
            PredicateValue::Scalar(Scalar::Text("MA_".into())),
        );
        assert!(good.is_ok());
    }
}
