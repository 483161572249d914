//! Record store port for products.
//!
//! The catalog composes a `ProductStore`; it never extends one. Implementations
//! are thin CRUD adapters with no business rules. Every read named `*_available`
//! applies the availability filter (`available = true`).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::ProductId;

use crate::product::{NewProduct, Product, ProductPatch};

pub mod in_memory;

pub use in_memory::InMemoryProductStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors**. They are propagated to callers as-is;
/// nothing in the catalog retries or translates them.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store query error: {0}")]
    Query(String),

    /// `update` targeted an id with no record at all.
    #[error("no product record with id {0}")]
    MissingRecord(ProductId),

    #[error("failed to decode product record: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Open the underlying connection. Called once at process start.
    async fn connect(&self) -> StoreResult<()>;

    /// Release the underlying connection. Called on shutdown.
    async fn close(&self);

    async fn insert(&self, product: NewProduct) -> StoreResult<Product>;

    async fn get_available(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Merge `patch` into the record by id, regardless of availability.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;

    async fn count_available(&self) -> StoreResult<u64>;

    /// Available products in store order (ascending id).
    async fn find_available(&self, skip: u64, take: u64) -> StoreResult<Vec<Product>>;

    /// Available products whose id is in `ids`. Order is unspecified.
    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn connect(&self) -> StoreResult<()> {
        (**self).connect().await
    }

    async fn close(&self) {
        (**self).close().await;
    }

    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        (**self).insert(product).await
    }

    async fn get_available(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).get_available(id).await
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        (**self).update(id, patch).await
    }

    async fn count_available(&self) -> StoreResult<u64> {
        (**self).count_available().await
    }

    async fn find_available(&self, skip: u64, take: u64) -> StoreResult<Vec<Product>> {
        (**self).find_available(skip, take).await
    }

    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        (**self).find_available_by_ids(ids).await
    }
}
