//! Broker-backed request queue (Redis).
//!
//! The transport loop that consumes this queue lives in `catalog-rpc`; this
//! module only moves raw request/reply payloads in and out of Redis.

pub mod redis_queue;

pub use redis_queue::{RedisQueueError, RedisRequestQueue};
