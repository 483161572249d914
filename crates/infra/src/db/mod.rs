//! Database adapters for the product store.

pub mod postgres;

pub use postgres::PostgresProductStore;
