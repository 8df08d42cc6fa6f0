//! Request-id generation for tick-scoped log correlation. spec.md §6 shapes
//! a generated id as `req_<ms_ts>_<8hex>` for inbound requests that don't
//! supply their own; the same shape is reused here to correlate the log
//! lines a single ingestion/alert tick or dispatch emits, via a
//! `tracing::Span` rather than passing the id through every call explicitly.

use chrono::Utc;
use uuid::Uuid;

pub fn generate_request_id() -> String {
    let ms_ts = Utc::now().timestamp_millis();
    let hex = Uuid::new_v4().simple().to_string();
    format!("req_{ms_ts}_{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_matches_the_spec_shape() {
        let id = generate_request_id();
        let rest = id.strip_prefix("req_").expect("req_ prefix");
        let mut parts = rest.splitn(2, '_');
        let ts = parts.next().unwrap();
        let hex = parts.next().unwrap();
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn two_calls_produce_different_ids() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
