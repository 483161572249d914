//! Request/response transports.
//!
//! Both transports feed raw frames to the same [`MessageRouter`] and stop
//! accepting work once their shutdown future resolves.
//!
//! [`MessageRouter`]: crate::router::MessageRouter

pub mod broker;
pub mod tcp;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport worker stopped unexpectedly: {0}")]
    Worker(String),
}
