//! Message-based RPC surface of the product catalog.
//!
//! If you're new to this crate, it is structured like:
//! - `message.rs`: wire frames and message patterns
//! - `dto.rs`: request payloads and their validation
//! - `errors.rs`: how failures are shaped on the wire
//! - `router.rs`: pattern → catalog operation dispatch
//! - `transport/`: TCP and Redis broker listeners
//! - `server.rs`: process wiring (store, router, transport)

pub mod dto;
pub mod errors;
pub mod message;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use errors::RpcError;
pub use message::{Command, CorrelationId, ReplyFrame, RequestFrame};
pub use router::MessageRouter;
