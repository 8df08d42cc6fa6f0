//! C6: the query engine. The store prefilters by symbol/timeframe/time
//! range; this compiles and runs the predicate tree over whatever window it
//! returns, accumulating `total_records`/`matched_records` the way
//! `QueryEngine.execute_query` does per timeframe in
//! `original_source/alerts/query_engine.py`.

use crate::domain::candle::Candle;
use crate::domain::query::{PredicateNode, QueryResult};
use crate::query::evaluator::evaluate;

pub struct QueryEngine;

impl QueryEngine {
    pub fn run(predicate: &PredicateNode, window: Vec<Candle>, limit: usize) -> QueryResult {
        let total_records = window.len();
        let mut matched: Vec<Candle> = window.into_iter().filter(|c| evaluate(predicate, c)).collect();
        matched.truncate(limit);

        QueryResult {
            total_records,
            matched_records: matched.len(),
            candles: matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Bar;
    use crate::domain::market::{Symbol, Timeframe};
    use crate::domain::query::{Operator, Predicate, PredicateValue, QueryField, Scalar};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candle(close: rust_decimal::Decimal) -> Candle {
        let bar = Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: dec!(10),
        };
        Candle::new(bar)
    }

    #[test]
    fn limit_truncates_matched_but_not_total() {
        let window = vec![candle(dec!(10)), candle(dec!(20)), candle(dec!(30))];
        let predicate = PredicateNode::leaf(
            Predicate::new(QueryField::Close, Operator::Gt, PredicateValue::Scalar(Scalar::Number(5.0))).unwrap(),
        );
        let result = QueryEngine::run(&predicate, window, 2);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.matched_records, 2);
    }
}
