pub mod alerting;
pub mod config;
pub mod domain;
pub mod indicators;
pub mod ingestion;
pub mod infrastructure;
pub mod logging;
pub mod query;
pub mod scheduler;
pub mod signals;
