//! Product catalog operations: lifecycle, paginated listing, batch validation.
//!
//! ## Consistency
//!
//! `update` and `remove` check existence with `find_one` and then write in a
//! separate store call; `find_all` counts and then fetches in two calls. None of
//! these sequences run inside a store transaction. A concurrent `remove` between
//! the check and the write of an `update` still lets the update land on the
//! now-unavailable record, and a listing can report metadata from a slightly
//! different snapshot than its data. Callers relying on stronger guarantees must
//! get them from the store.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::{debug, info, instrument};

use catalog_core::{DomainError, ProductId};

use crate::pagination::{Page, PagePlan, PageRequest};
use crate::product::{NewProduct, Product, ProductChanges, ProductPatch};
use crate::store::{ProductStore, StoreError};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure of a catalog operation.
///
/// `Domain` failures are business outcomes callers branch on; `Store` failures
/// are passed through untouched from the store adapter.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Record-management component over a [`ProductStore`].
#[derive(Debug)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S> ProductCatalog<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert a product and return the stored record unchanged.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> CatalogResult<Product> {
        let created = self.store.insert(product).await?;
        info!(id = %created.id, "product created");
        Ok(created)
    }

    /// List available products, clamping out-of-range pages to the last page.
    #[instrument(skip(self), fields(page = request.page(), limit = request.limit()))]
    pub async fn find_all(&self, request: PageRequest) -> CatalogResult<Page<Product>> {
        let total = self.store.count_available().await?;
        let plan = PagePlan::compute(total, request);

        if plan.was_clamped(request) {
            debug!(
                resolved_page = plan.metadata.page,
                last_page = plan.metadata.last_page,
                "requested page out of range; serving last page"
            );
        }

        let data = match plan.slice {
            Some(slice) => self.store.find_available(slice.skip, slice.take).await?,
            None => Vec::new(),
        };

        Ok(Page {
            data,
            metadata: plan.metadata,
        })
    }

    /// Look up an available product. Missing and unavailable ids fail alike.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: ProductId) -> CatalogResult<Product> {
        match self.store.get_available(id).await? {
            Some(product) => Ok(product),
            None => {
                debug!(%id, "product not found");
                Err(DomainError::not_found(id).into())
            }
        }
    }

    /// Merge `changes` into an available product. Any id inside `changes` is ignored.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: ProductId, changes: ProductChanges) -> CatalogResult<Product> {
        if let Some(other) = changes.id.filter(|other| *other != id) {
            debug!(%id, ignored_id = %other, "ignoring id supplied in update payload");
        }
        let patch = changes.into_patch();

        self.find_one(id).await?;

        let updated = self.store.update(id, patch).await?;
        info!(%id, "product updated");
        Ok(updated)
    }

    /// Soft delete: flip `available` to false. The record is never physically removed.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: ProductId) -> CatalogResult<Product> {
        self.find_one(id).await?;

        let removed = self.store.update(id, ProductPatch::mark_unavailable()).await?;
        info!(%id, "product marked unavailable");
        Ok(removed)
    }

    /// Confirm every distinct id refers to an available product.
    ///
    /// Duplicates in `ids` are collapsed. The returned records are in store
    /// order, not request order.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn validate_products(&self, ids: &[ProductId]) -> CatalogResult<Vec<Product>> {
        let wanted: Vec<ProductId> = ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.store.find_available_by_ids(&wanted).await?;

        let seen: HashSet<ProductId> = found.iter().map(|p| p.id).collect();
        let missing: Vec<ProductId> = wanted
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();

        if !missing.is_empty() || found.len() != wanted.len() {
            debug!(missing = ?missing, "batch validation failed");
            return Err(DomainError::some_not_found(missing).into());
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::pagination::PageMetadata;
    use crate::store::{InMemoryProductStore, StoreResult};

    fn id(value: i64) -> ProductId {
        ProductId::new(value)
    }

    async fn seeded(count: usize) -> ProductCatalog<Arc<InMemoryProductStore>> {
        let catalog = ProductCatalog::new(Arc::new(InMemoryProductStore::new()));
        for n in 1..=count {
            catalog
                .create(NewProduct::new(format!("Product {n}"), n as f64 * 10.0))
                .await
                .unwrap();
        }
        catalog
    }

    fn expect_not_found(err: CatalogError, expected: ProductId) {
        match err {
            CatalogError::Domain(DomainError::NotFound { id }) => assert_eq!(id, expected),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_returns_the_stored_record() {
        let catalog = seeded(0).await;
        let created = catalog
            .create(NewProduct {
                description: Some("wireless".to_string()),
                ..NewProduct::new("Mouse", 19.99)
            })
            .await
            .unwrap();

        assert_eq!(created.id, id(1));
        assert_eq!(created.name, "Mouse");
        assert_eq!(created.price, 19.99);
        assert_eq!(created.description.as_deref(), Some("wireless"));
        assert!(created.available);
    }

    #[tokio::test]
    async fn find_all_serves_the_requested_page() {
        let catalog = seeded(5).await;

        let page = catalog.find_all(PageRequest::new(1, 2).unwrap()).await.unwrap();

        let ids: Vec<i64> = page.data.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(
            page.metadata,
            PageMetadata {
                total: 5,
                page: 1,
                last_page: 3
            }
        );
    }

    #[tokio::test]
    async fn find_all_clamps_past_the_last_page() {
        let catalog = seeded(5).await;

        let page = catalog.find_all(PageRequest::new(10, 2).unwrap()).await.unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, id(5));
        assert_eq!(
            page.metadata,
            PageMetadata {
                total: 5,
                page: 3,
                last_page: 3
            }
        );
    }

    #[tokio::test]
    async fn find_all_on_empty_catalog_is_page_zero() {
        let catalog = seeded(0).await;

        let page = catalog.find_all(PageRequest::new(3, 10).unwrap()).await.unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.metadata.page, 0);
        assert_eq!(page.metadata.last_page, 0);
        assert_eq!(page.metadata.total, 0);
    }

    #[tokio::test]
    async fn find_all_counts_only_available_products() {
        let catalog = seeded(4).await;
        catalog.remove(id(2)).await.unwrap();

        let page = catalog.find_all(PageRequest::new(1, 10).unwrap()).await.unwrap();

        let ids: Vec<i64> = page.data.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(page.metadata.total, 3);
        assert_eq!(page.metadata.last_page, 1);
    }

    #[tokio::test]
    async fn find_one_fails_identically_for_missing_and_removed() {
        let catalog = seeded(1).await;
        catalog.remove(id(1)).await.unwrap();

        let removed = catalog.find_one(id(1)).await.unwrap_err();
        let missing = catalog.find_one(id(99)).await.unwrap_err();

        assert_eq!(removed.to_string(), "Product with id 1 not found");
        assert_eq!(missing.to_string(), "Product with id 99 not found");
        expect_not_found(removed, id(1));
        expect_not_found(missing, id(99));
    }

    #[tokio::test]
    async fn update_ignores_payload_id() {
        let catalog = seeded(2).await;
        let changes = ProductChanges {
            id: Some(id(2)),
            name: Some("X".to_string()),
            ..ProductChanges::default()
        };

        let updated = catalog.update(id(1), changes).await.unwrap();

        assert_eq!(updated.id, id(1));
        assert_eq!(updated.name, "X");
        assert_eq!(updated.price, 10.0);
        let untouched = catalog.find_one(id(2)).await.unwrap();
        assert_eq!(untouched.name, "Product 2");
    }

    #[tokio::test]
    async fn update_of_removed_product_is_not_found() {
        let catalog = seeded(1).await;
        catalog.remove(id(1)).await.unwrap();

        let err = catalog
            .update(
                id(1),
                ProductChanges {
                    price: Some(1.0),
                    ..ProductChanges::default()
                },
            )
            .await
            .unwrap_err();

        expect_not_found(err, id(1));
        assert_eq!(catalog.store().get_any(id(1)).unwrap().price, 10.0);
    }

    #[tokio::test]
    async fn remove_is_a_soft_delete() {
        let catalog = seeded(1).await;

        let removed = catalog.remove(id(1)).await.unwrap();
        assert!(!removed.available);

        expect_not_found(catalog.find_one(id(1)).await.unwrap_err(), id(1));

        let still_stored = catalog.store().get_any(id(1)).unwrap();
        assert_eq!(still_stored.name, "Product 1");
        assert!(!still_stored.available);
    }

    #[tokio::test]
    async fn removing_twice_is_not_found() {
        let catalog = seeded(1).await;
        catalog.remove(id(1)).await.unwrap();

        expect_not_found(catalog.remove(id(1)).await.unwrap_err(), id(1));
    }

    #[tokio::test]
    async fn validate_products_deduplicates() {
        let catalog = seeded(2).await;

        let products = catalog.validate_products(&[id(1), id(1), id(2)]).await.unwrap();

        assert_eq!(products.len(), 2);
        let ids: BTreeSet<ProductId> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, BTreeSet::from([id(1), id(2)]));
    }

    #[tokio::test]
    async fn validate_products_rejects_unavailable_or_absent_ids() {
        let catalog = seeded(2).await;
        catalog.remove(id(2)).await.unwrap();

        let err = catalog.validate_products(&[id(1), id(1), id(2), id(7)]).await.unwrap_err();

        match err {
            CatalogError::Domain(DomainError::SomeNotFound { missing }) => {
                assert_eq!(missing, vec![id(2), id(7)]);
            }
            other => panic!("expected SomeNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn validate_products_with_no_ids_is_trivially_valid() {
        let catalog = seeded(1).await;
        assert!(catalog.validate_products(&[]).await.unwrap().is_empty());
    }

    struct OfflineStore;

    #[async_trait]
    impl ProductStore for OfflineStore {
        async fn connect(&self) -> StoreResult<()> {
            Err(StoreError::Connection("offline".to_string()))
        }

        async fn close(&self) {}

        async fn insert(&self, _product: NewProduct) -> StoreResult<Product> {
            Err(StoreError::Connection("offline".to_string()))
        }

        async fn get_available(&self, _id: ProductId) -> StoreResult<Option<Product>> {
            Err(StoreError::Connection("offline".to_string()))
        }

        async fn update(&self, id: ProductId, _patch: ProductPatch) -> StoreResult<Product> {
            Err(StoreError::MissingRecord(id))
        }

        async fn count_available(&self) -> StoreResult<u64> {
            Err(StoreError::Query("count failed".to_string()))
        }

        async fn find_available(&self, _skip: u64, _take: u64) -> StoreResult<Vec<Product>> {
            Err(StoreError::Query("find failed".to_string()))
        }

        async fn find_available_by_ids(&self, _ids: &[ProductId]) -> StoreResult<Vec<Product>> {
            Err(StoreError::Query("find failed".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failures_propagate_unmodified() {
        let catalog = ProductCatalog::new(OfflineStore);

        let err = catalog.find_one(id(1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Connection(_))));

        let err = catalog.find_all(PageRequest::default()).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Store(StoreError::Query(ref m)) if m == "count failed"
        ));

        let err = catalog.validate_products(&[id(1)]).await.unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Query(_))));
    }
}
