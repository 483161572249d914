use std::process::ExitCode;

use catalog_infra::{AppConfig, ConfigError, LogFormat};
use catalog_observability::LogSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        // --help, --version and clap usage errors print their own message.
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            // Logging is not initialized yet.
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    catalog_observability::init(&LogSettings {
        default_filter: config.log_level.clone(),
        json: config.log_format == LogFormat::Json,
    });

    tracing::info!(
        transport = ?config.transport,
        addr = %config.listen_addr,
        error_policy = ?config.error_policy,
        "starting product catalog service"
    );

    match catalog_rpc::server::run(config).await {
        Ok(()) => {
            tracing::info!("service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "service failed");
            ExitCode::FAILURE
        }
    }
}
