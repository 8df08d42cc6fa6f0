pub mod binance;
pub mod dispatcher;
pub mod persistence;

pub use binance::{BinanceAdapter, MockAdapter};
pub use dispatcher::WebhookDispatcher;
