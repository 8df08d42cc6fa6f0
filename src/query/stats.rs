//! Historical-statistics helper (spec.md §4.6), grounded on
//! `original_source/alerts/query_engine.py::get_historical_stats`: nulls are
//! dropped before aggregation, and an empty window collapses to all-`None`
//! rather than erroring (R3).

use crate::domain::candle::Candle;
use crate::domain::query::QueryField;
use crate::query::evaluator::field_value;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub current: Option<f64>,
    pub previous: Option<f64>,
}

/// `window` must be in ascending `open_time` order, latest bar last.
pub fn historical_stats(window: &[Candle], field: QueryField) -> FieldStats {
    let values: Vec<f64> = window.iter().filter_map(|c| field_value(field, c)).collect();

    if values.is_empty() {
        return FieldStats::default();
    }

    let count = values.len();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / count as f64;
    let current = values.last().copied();
    let previous = if values.len() >= 2 {
        Some(values[values.len() - 2])
    } else {
        None
    };

    FieldStats {
        count,
        min: Some(min),
        max: Some(max),
        avg: Some(avg),
        current,
        previous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Bar, Candle, Indicators};
    use crate::domain::market::{Symbol, Timeframe};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candle_with_rsi(rsi: Option<f64>) -> Candle {
        let bar = Bar {
            symbol: Symbol::Btc,
            timeframe: Timeframe::FiveMin,
            open_time: Utc::now(),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100),
            volume: dec!(10),
        };
        let mut candle = Candle::new(bar);
        candle.indicators = Indicators {
            rsi14: rsi,
            ..Default::default()
        };
        candle
    }

    #[test]
    fn empty_window_collapses_to_all_none() {
        let stats = historical_stats(&[], QueryField::Rsi14);
        assert_eq!(stats, FieldStats::default());
    }

    #[test]
    fn nulls_are_dropped_before_aggregation() {
        let window = vec![
            candle_with_rsi(Some(40.0)),
            candle_with_rsi(None),
            candle_with_rsi(Some(60.0)),
        ];
        let stats = historical_stats(&window, QueryField::Rsi14);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, Some(40.0));
        assert_eq!(stats.max, Some(60.0));
        assert_eq!(stats.current, Some(60.0));
        assert_eq!(stats.previous, Some(40.0));
    }
}
