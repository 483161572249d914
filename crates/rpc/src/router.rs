//! Pattern → catalog operation dispatch.
//!
//! The router is transport-agnostic: transports hand it raw frames and write
//! back whatever reply it produces.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use catalog_infra::ErrorPolicy;
use catalog_products::{ProductCatalog, ProductStore};

use crate::dto::{
    self, CreateProductRequest, PaginationRequest, ProductIdRequest, UpdateProductRequest,
    ValidateProductsRequest,
};
use crate::errors::RpcError;
use crate::message::{Command, CorrelationId, ReplyFrame, RequestFrame};

/// A reply plus where it should go (broker transport only).
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub reply: ReplyFrame,
    pub reply_to: Option<String>,
}

#[derive(Debug)]
pub struct MessageRouter<S> {
    catalog: ProductCatalog<S>,
    policy: ErrorPolicy,
}

impl<S> MessageRouter<S>
where
    S: ProductStore,
{
    pub fn new(catalog: ProductCatalog<S>, policy: ErrorPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &ProductCatalog<S> {
        &self.catalog
    }

    /// Run one operation.
    pub async fn dispatch(&self, command: Command, data: Value) -> Result<Value, RpcError> {
        match command {
            Command::CreateProduct => {
                let product = dto::decode::<CreateProductRequest>(data)?.into_new_product()?;
                to_json(self.catalog.create(product).await?)
            }
            Command::FindAllProducts => {
                let request = dto::decode::<PaginationRequest>(data)?.into_page_request()?;
                to_json(self.catalog.find_all(request).await?)
            }
            Command::FindOneProduct => {
                let id = dto::decode::<ProductIdRequest>(data)?.into_id()?;
                to_json(self.catalog.find_one(id).await?)
            }
            Command::UpdateProduct => {
                let (id, changes) = dto::decode::<UpdateProductRequest>(data)?.into_changes()?;
                to_json(self.catalog.update(id, changes).await?)
            }
            Command::DeleteProduct => {
                let id = dto::decode::<ProductIdRequest>(data)?.into_id()?;
                to_json(self.catalog.remove(id).await?)
            }
            Command::ValidateProducts => {
                let ids = dto::decode::<ValidateProductsRequest>(data)?.into_ids()?;
                to_json(self.catalog.validate_products(&ids).await?)
            }
        }
    }

    /// Resolve the pattern, dispatch, and build the reply frame.
    pub async fn handle(&self, frame: RequestFrame) -> Handled {
        let RequestFrame {
            id,
            pattern,
            data,
            reply_to,
        } = frame;

        let result = match Command::from_name(pattern.name()) {
            Some(command) => {
                debug!(pattern = %command, id = ?id, "handling request");
                self.dispatch(command, data).await
            }
            None => Err(RpcError::UnknownPattern(pattern.name().to_string())),
        };

        let reply = match result {
            Ok(response) => ReplyFrame::ok(id, response),
            Err(err) => {
                self.log_failure(&err, pattern.name());
                ReplyFrame::err(id, err.to_payload(self.policy))
            }
        };

        Handled { reply, reply_to }
    }

    /// Parse a raw JSON frame and handle it. Malformed frames get an error reply
    /// carrying the correlation id when it can be recovered.
    pub async fn handle_raw(&self, raw: &str) -> Handled {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => return self.reject(Some(raw), e.to_string()),
        };

        let (id, reply_to) = envelope_of(&value);
        match serde_json::from_value::<RequestFrame>(value) {
            Ok(frame) => self.handle(frame).await,
            Err(e) => self.malformed(id, reply_to, e.to_string()),
        }
    }

    /// Error reply for a frame the transport could not hand over as a request
    /// (bad encoding, over the size limit). `raw` is whatever part of the frame
    /// is readable; its correlation id is echoed when it can be recovered.
    pub fn reject(&self, raw: Option<&str>, reason: impl Into<String>) -> Handled {
        let (id, reply_to) = raw
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .map(|value| envelope_of(&value))
            .unwrap_or_default();
        self.malformed(id, reply_to, reason.into())
    }

    fn malformed(
        &self,
        id: Option<CorrelationId>,
        reply_to: Option<String>,
        reason: String,
    ) -> Handled {
        let err = RpcError::Malformed(reason);
        warn!(error = %err, "rejecting malformed frame");
        Handled {
            reply: ReplyFrame::err(id, err.to_payload(self.policy)),
            reply_to,
        }
    }

    fn log_failure(&self, err: &RpcError, pattern: &str) {
        if err.is_business() {
            debug!(pattern, error = %err, "request rejected");
        } else if let RpcError::UnknownPattern(_) = err {
            warn!(pattern, "no handler for pattern");
        } else {
            error!(pattern, error = %err, "request failed");
        }
    }
}

/// Correlation id and reply address of a frame, read leniently.
fn envelope_of(value: &Value) -> (Option<CorrelationId>, Option<String>) {
    let id = value.get("id").and_then(CorrelationId::from_value);
    let reply_to = value
        .get("replyTo")
        .and_then(Value::as_str)
        .map(str::to_string);
    (id, reply_to)
}

fn to_json<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::Internal(format!("serialize response: {e}")))
}
