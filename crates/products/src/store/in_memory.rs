use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use catalog_core::ProductId;

use super::{ProductStore, StoreError, StoreResult};
use crate::product::{NewProduct, Product, ProductPatch};

#[derive(Debug)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

/// In-memory product store for tests/dev.
///
/// Ids are assigned sequentially from 1. Rows are kept in id order, which is the
/// store default ordering for listings.
#[derive(Debug)]
pub struct InMemoryProductStore {
    inner: RwLock<Inner>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    /// Unfiltered lookup: returns the record even when it is unavailable.
    #[cfg(test)]
    pub(crate) fn get_any(&self, id: ProductId) -> Option<Product> {
        self.read().ok()?.rows.get(&id).cloned()
    }

    /// Total stored rows, including unavailable ones.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.read().map(|inner| inner.rows.len()).unwrap_or(0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Query("in-memory product store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Query("in-memory product store lock poisoned".to_string()))
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn connect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}

    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let mut inner = self.write()?;
        let id = ProductId::new(inner.next_id);
        inner.next_id += 1;

        let now = Utc::now();
        let record = Product {
            id,
            name: product.name,
            price: product.price,
            description: product.description,
            available: product.available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get_available(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let inner = self.read()?;
        Ok(inner.rows.get(&id).filter(|p| p.available).cloned())
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut inner = self.write()?;
        let record = inner
            .rows
            .get_mut(&id)
            .ok_or(StoreError::MissingRecord(id))?;
        patch.apply_to(record, Utc::now());
        Ok(record.clone())
    }

    async fn count_available(&self) -> StoreResult<u64> {
        let inner = self.read()?;
        Ok(inner.rows.values().filter(|p| p.available).count() as u64)
    }

    async fn find_available(&self, skip: u64, take: u64) -> StoreResult<Vec<Product>> {
        let skip = usize::try_from(skip).map_err(|e| StoreError::Query(format!("skip: {e}")))?;
        let take = usize::try_from(take).map_err(|e| StoreError::Query(format!("take: {e}")))?;

        let inner = self.read()?;
        Ok(inner
            .rows
            .values()
            .filter(|p| p.available)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let inner = self.read()?;
        Ok(inner
            .rows
            .values()
            .filter(|p| p.available && ids.contains(&p.id))
            .cloned()
            .collect())
    }
}
