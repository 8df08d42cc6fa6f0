pub mod alert_repository;
pub mod candle_repository;
pub mod database;

pub use alert_repository::SqliteAlertRegistry;
pub use candle_repository::SqliteCandleRepository;
pub use database::Database;
