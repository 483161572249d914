//! Process wiring: store, router, transport.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use catalog_infra::broker::RedisRequestQueue;
use catalog_infra::{AppConfig, PostgresProductStore, StoreUrl, TransportKind};
use catalog_products::{InMemoryProductStore, ProductCatalog, ProductStore};

use crate::router::MessageRouter;
use crate::shutdown;
use crate::transport::{broker, tcp};

/// Run the service until a shutdown signal arrives.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    match &config.store {
        StoreUrl::Memory => {
            warn!("using in-memory product store; data is lost on exit");
            serve(Arc::new(InMemoryProductStore::new()), &config).await
        }
        StoreUrl::Postgres(url) => {
            let store = PostgresProductStore::from_url(url).context("invalid DATABASE_URL")?;
            serve(store, &config).await
        }
    }
}

async fn serve<S>(store: S, config: &AppConfig) -> anyhow::Result<()>
where
    S: ProductStore + 'static,
{
    store
        .connect()
        .await
        .context("failed to connect to the product store")?;
    info!("product store connected");

    let router = Arc::new(MessageRouter::new(
        ProductCatalog::new(store),
        config.error_policy,
    ));

    let served = match config.transport {
        TransportKind::Tcp => {
            let listener = TcpListener::bind(config.listen_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.listen_addr))?;
            tcp::serve(
                listener,
                Arc::clone(&router),
                config.max_frame_bytes,
                stop_signal(),
            )
            .await
        }
        TransportKind::Broker => {
            let servers = config.broker_servers.clone();
            let queue_name = config.broker_queue.clone();
            let queue = tokio::task::spawn_blocking(move || {
                RedisRequestQueue::connect(&servers, &queue_name)
            })
            .await
            .context("broker connect task failed")?
            .context("failed to connect to the broker")?;
            broker::serve(queue, Arc::clone(&router), stop_signal()).await
        }
    };

    router.catalog().store().close().await;
    info!("product store closed");

    served.context("transport failed")
}

async fn stop_signal() {
    if let Err(e) = shutdown::signal().await {
        error!(error = %e, "cannot listen for shutdown signals; stopping");
    }
}
