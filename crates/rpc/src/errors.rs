//! How failures are shaped on the wire.
//!
//! Business failures (not-found, batch validation, payload validation) are
//! always sent as explicit error replies shaped by the configured
//! [`ErrorPolicy`]. Store failures are opaque: the caller sees a generic
//! internal error and the detail goes to the log.

use serde_json::{Value, json};
use thiserror::Error;

use catalog_core::DomainError;
use catalog_infra::ErrorPolicy;
use catalog_products::CatalogError;

const INTERNAL_MESSAGE: &str = "Internal server error";
const NO_HANDLER_MESSAGE: &str =
    "There is no matching message handler defined in the remote service.";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The frame itself could not be understood.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("no handler for pattern '{0}'")]
    UnknownPattern(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for RpcError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Domain(e) => Self::Domain(e),
            CatalogError::Store(e) => Self::Internal(e.to_string()),
        }
    }
}

impl RpcError {
    /// Whether this is a caller-facing business failure (as opposed to a fault).
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::Malformed(_))
    }

    pub fn to_payload(&self, policy: ErrorPolicy) -> Value {
        match self {
            Self::Domain(err) => domain_payload(err, policy),
            Self::Malformed(msg) => bad_request(msg, policy),
            Self::UnknownPattern(_) => json!({"status": "error", "message": NO_HANDLER_MESSAGE}),
            Self::Internal(_) => json!({"status": "error", "message": INTERNAL_MESSAGE}),
        }
    }
}

fn domain_payload(err: &DomainError, policy: ErrorPolicy) -> Value {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => bad_request(&message, policy),
        DomainError::NotFound { .. } => not_found(&message, policy),
        DomainError::SomeNotFound { missing } => {
            let mut payload = not_found(&message, policy);
            payload["missingIds"] = json!(missing);
            payload
        }
    }
}

fn bad_request(message: &str, policy: ErrorPolicy) -> Value {
    match policy {
        ErrorPolicy::Structured => json!({"status": 400, "message": message}),
        ErrorPolicy::Plain => {
            json!({"statusCode": 400, "message": message, "error": "Bad Request"})
        }
    }
}

fn not_found(message: &str, policy: ErrorPolicy) -> Value {
    match policy {
        ErrorPolicy::Structured => json!({"status": 400, "message": message}),
        ErrorPolicy::Plain => {
            json!({"statusCode": 404, "message": message, "error": "Not Found"})
        }
    }
}
