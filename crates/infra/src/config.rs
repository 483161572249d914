//! Configuration loading and representation.
//!
//! Settings come from CLI flags with environment fallbacks (a `.env` file is
//! loaded first when present). They are validated once into an immutable
//! [`AppConfig`]; any missing or malformed setting aborts startup.

use std::net::{IpAddr, SocketAddr};

use clap::{Parser, ValueEnum};
use thiserror::Error;

/// Which request/response transport the service listens on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Addressed socket: newline-delimited JSON over TCP.
    Tcp,
    /// Broker-backed request queue (Redis).
    Broker,
}

/// How business failures are shaped when they cross the transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    /// `{ "status": 400, "message": ... }`
    Structured,
    /// `{ "statusCode": 404, "message": ..., "error": "Not Found" }`
    Plain,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Raw command-line/environment settings, before validation.
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-rpc", about = "Product catalog record service", long_about = None)]
pub struct CliArgs {
    /// Listening port
    #[arg(long, env = "PORT")]
    pub port: u16,

    /// Bind host
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Store connection string (`postgres://...`, or `memory://` for the in-memory store)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Comma-separated broker addresses
    #[arg(long, env = "BROKER_SERVERS", value_delimiter = ',', required = true)]
    pub broker_servers: Vec<String>,

    /// Request/response transport
    #[arg(long, env = "TRANSPORT", value_enum, default_value = "tcp")]
    pub transport: TransportKind,

    /// Broker request queue prefix
    #[arg(long, env = "BROKER_QUEUE", default_value = "products")]
    pub broker_queue: String,

    /// Error wrapping policy for business failures
    #[arg(long, env = "ERROR_POLICY", value_enum, default_value = "structured")]
    pub error_policy: ErrorPolicy,

    /// Default log filter (RUST_LOG takes precedence)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    /// Longest accepted request frame, in bytes (TCP transport)
    #[arg(long, env = "MAX_FRAME_BYTES", default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: usize,
}

/// 1 MiB.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Where products are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Postgres(String),
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("Config validation error: {key} {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Validated process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub store: StoreUrl,
    pub broker_servers: Vec<String>,
    pub broker_queue: String,
    pub transport: TransportKind,
    pub error_policy: ErrorPolicy,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_frame_bytes: usize,
}

impl AppConfig {
    /// Load from `.env`, environment and process arguments.
    pub fn load() -> Result<Self, ConfigError> {
        // Missing .env is fine.
        _ = dotenvy::dotenv();

        CliArgs::try_parse()?.validate()
    }

    /// Parse from an explicit argument list (environment fallbacks still apply).
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        CliArgs::try_parse_from(args)?.validate()
    }
}

impl CliArgs {
    pub fn validate(self) -> Result<AppConfig, ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid("PORT", "must be a non-zero port number"));
        }

        let host: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("HOST", format!("is not a valid IP address: {e}")))?;
        let listen_addr = SocketAddr::new(host, self.port);

        if self.max_frame_bytes == 0 {
            return Err(ConfigError::invalid("MAX_FRAME_BYTES", "must be greater than 0"));
        }

        let store = parse_store_url(&self.database_url)?;
        let broker_servers = parse_broker_servers(&self.broker_servers)?;

        let broker_queue = self.broker_queue.trim().to_string();
        if broker_queue.is_empty() {
            return Err(ConfigError::invalid("BROKER_QUEUE", "must not be empty"));
        }

        Ok(AppConfig {
            listen_addr,
            store,
            broker_servers,
            broker_queue,
            transport: self.transport,
            error_policy: self.error_policy,
            log_level: self.log_level,
            log_format: self.log_format,
            max_frame_bytes: self.max_frame_bytes,
        })
    }
}

fn parse_store_url(raw: &str) -> Result<StoreUrl, ConfigError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ConfigError::invalid("DATABASE_URL", "is required"));
    }

    match url.split_once("://") {
        Some(("postgres" | "postgresql", rest)) if !rest.is_empty() => {
            Ok(StoreUrl::Postgres(url.to_string()))
        }
        Some(("memory", _)) => Ok(StoreUrl::Memory),
        _ => Err(ConfigError::invalid(
            "DATABASE_URL",
            "must be a postgres:// or memory:// connection string",
        )),
    }
}

fn parse_broker_servers(raw: &[String]) -> Result<Vec<String>, ConfigError> {
    let servers: Vec<String> = raw
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if servers.is_empty() {
        return Err(ConfigError::invalid("BROKER_SERVERS", "must list at least one server"));
    }

    if let Some(bad) = servers
        .iter()
        .find(|s| !(s.starts_with("redis://") || s.starts_with("rediss://")))
    {
        return Err(ConfigError::invalid(
            "BROKER_SERVERS",
            format!("'{bad}' is not a redis:// or rediss:// address"),
        ));
    }

    Ok(servers)
}
