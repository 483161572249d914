//! Redis request-queue consumer.
//!
//! The Redis client is synchronous, so the consume loop runs on a blocking
//! thread and re-enters the runtime for each request. Replies go to the list
//! named by the request's `replyTo`; a request without one is handled and its
//! reply dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{info, warn};

use catalog_infra::broker::RedisRequestQueue;
use catalog_products::ProductStore;

use crate::router::MessageRouter;

use super::TransportError;

/// Upper bound on how long a stop request waits for the blocking pop.
const POLL_TIMEOUT: Duration = Duration::from_secs(1);

const RECONNECT_BACKOFF: Duration = Duration::from_millis(500);

/// Consume the request queue until `shutdown` resolves.
pub async fn serve<S, F>(
    queue: RedisRequestQueue,
    router: Arc<MessageRouter<S>>,
    shutdown: F,
) -> Result<(), TransportError>
where
    S: ProductStore + 'static,
    F: Future<Output = ()>,
{
    info!(server = queue.server(), key = queue.requests_key(), "broker transport listening");

    let stop = Arc::new(AtomicBool::new(false));
    let runtime = Handle::current();
    let mut worker = {
        let stop = Arc::clone(&stop);
        tokio::task::spawn_blocking(move || consume(&queue, &router, &runtime, &stop))
    };
    tokio::pin!(shutdown);

    let joined = tokio::select! {
        joined = &mut worker => joined,
        () = &mut shutdown => {
            info!("broker transport stopping");
            stop.store(true, Ordering::Relaxed);
            worker.await
        }
    };

    joined.map_err(|e| TransportError::Worker(e.to_string()))
}

fn consume<S>(
    queue: &RedisRequestQueue,
    router: &MessageRouter<S>,
    runtime: &Handle,
    stop: &AtomicBool,
) where
    S: ProductStore,
{
    let mut conn = None;

    while !stop.load(Ordering::Relaxed) {
        if conn.is_none() {
            match queue.connection() {
                Ok(c) => conn = Some(c),
                Err(e) => {
                    warn!(error = %e, "broker connection failed; retrying");
                    thread::sleep(RECONNECT_BACKOFF);
                    continue;
                }
            }
        }
        let Some(c) = conn.as_mut() else { continue };

        let payload = match queue.pop_request(c, POLL_TIMEOUT) {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "broker pop failed; reconnecting");
                conn = None;
                thread::sleep(RECONNECT_BACKOFF);
                continue;
            }
        };

        let handled = runtime.block_on(router.handle_raw(&payload));
        let Some(reply_to) = handled.reply_to else {
            warn!(id = ?handled.reply.id, "request has no replyTo; reply dropped");
            continue;
        };

        let line = handled.reply.to_line();
        if let Err(e) = queue.push_reply(c, &reply_to, line.trim_end()) {
            warn!(error = %e, %reply_to, "failed to deliver reply");
            conn = None;
        }
    }
}
