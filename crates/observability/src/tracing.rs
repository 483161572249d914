//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Subscriber settings resolved from process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset (e.g. `info`, `catalog_products=debug`).
    pub default_filter: String,
    /// JSON lines when true, human-readable output otherwise.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: true,
        }
    }
}

impl LogSettings {
    /// `RUST_LOG` wins over the configured default; an unparsable default falls back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}
