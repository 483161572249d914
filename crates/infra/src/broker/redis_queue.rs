//! Redis list-backed request/reply queue.
//!
//! ## Layout
//!
//! - **Request list**: `<queue>:requests`. Callers `LPUSH` JSON requests carrying
//!   a `replyTo` key; the service pops from the other end (`BRPOP`), so requests
//!   are served in arrival order.
//! - **Reply lists**: one per caller-chosen `replyTo` key. Replies are pushed
//!   with a TTL so abandoned reply lists expire.
//!
//! Delivery is at-most-once: a request popped by a service that crashes before
//! replying is lost, and the caller is expected to time out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

const REQUESTS_SUFFIX: &str = "requests";

/// Default lifetime of a reply list nobody collected.
const DEFAULT_REPLY_TTL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum RedisQueueError {
    #[error("Redis connection error: {0}")]
    Connection(String),

    #[error("Redis command error: {0}")]
    Command(String),
}

#[derive(Debug, Clone)]
pub struct RedisRequestQueue {
    client: Arc<redis::Client>,
    server: String,
    requests_key: String,
    reply_ttl_secs: u64,
}

impl RedisRequestQueue {
    /// Connect to the first reachable server in `servers`.
    ///
    /// Each candidate is opened and pinged in order; unreachable servers are
    /// logged and skipped.
    pub fn connect(servers: &[String], queue: &str) -> Result<Self, RedisQueueError> {
        let mut last_error = None;

        for server in servers {
            match Self::probe(server) {
                Ok(client) => {
                    info!(%server, queue, "connected to broker");
                    return Ok(Self {
                        client: Arc::new(client),
                        server: server.clone(),
                        requests_key: format!("{queue}:{REQUESTS_SUFFIX}"),
                        reply_ttl_secs: DEFAULT_REPLY_TTL_SECS,
                    });
                }
                Err(e) => {
                    warn!(%server, error = %e, "broker unreachable");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            RedisQueueError::Connection("no broker servers configured".to_string())
        }))
    }

    fn probe(server: &str) -> Result<redis::Client, RedisQueueError> {
        let client =
            redis::Client::open(server).map_err(|e| RedisQueueError::Connection(e.to_string()))?;
        let mut conn = client
            .get_connection()
            .map_err(|e| RedisQueueError::Connection(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| RedisQueueError::Connection(format!("PING failed: {e}")))?;
        Ok(client)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn requests_key(&self) -> &str {
        &self.requests_key
    }

    /// Open a dedicated connection (blocking pops hold their connection).
    pub fn connection(&self) -> Result<redis::Connection, RedisQueueError> {
        self.client
            .get_connection()
            .map_err(|e| RedisQueueError::Connection(e.to_string()))
    }

    /// Block up to `timeout` for the next request payload.
    pub fn pop_request(
        &self,
        conn: &mut redis::Connection,
        timeout: Duration,
    ) -> Result<Option<String>, RedisQueueError> {
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.requests_key)
            .arg(timeout.as_secs().max(1))
            .query(conn)
            .map_err(|e| RedisQueueError::Command(format!("BRPOP failed: {e}")))?;

        Ok(popped.map(|(_key, payload)| payload))
    }

    /// Deliver a reply payload to `reply_to` and set its expiry.
    #[instrument(skip(self, conn, payload), fields(reply_to = %reply_to), err)]
    pub fn push_reply(
        &self,
        conn: &mut redis::Connection,
        reply_to: &str,
        payload: &str,
    ) -> Result<(), RedisQueueError> {
        redis::pipe()
            .atomic()
            .cmd("LPUSH")
            .arg(reply_to)
            .arg(payload)
            .ignore()
            .cmd("EXPIRE")
            .arg(reply_to)
            .arg(self.reply_ttl_secs)
            .ignore()
            .query::<()>(conn)
            .map_err(|e| RedisQueueError::Command(format!("reply push failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_server_list_is_a_connection_error() {
        let err = RedisRequestQueue::connect(&[], "products").unwrap_err();
        assert!(matches!(err, RedisQueueError::Connection(msg) if msg.contains("no broker")));
    }

    #[test]
    fn malformed_server_is_skipped_with_its_error_reported() {
        let err = RedisRequestQueue::connect(&["not-a-redis-url".to_string()], "products")
            .unwrap_err();
        assert!(matches!(err, RedisQueueError::Connection(_)));
    }
}
