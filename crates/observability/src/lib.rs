//! Tracing/logging setup shared by the catalog binaries.

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use self::tracing::{LogSettings, init};
