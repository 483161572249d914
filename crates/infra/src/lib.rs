//! Infrastructure layer: Postgres store, Redis broker queue, config.

pub mod broker;
pub mod config;
pub mod db;

pub use config::{AppConfig, ConfigError, ErrorPolicy, LogFormat, StoreUrl, TransportKind};
pub use db::PostgresProductStore;
