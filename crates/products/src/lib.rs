//! Products domain module (record-managed catalog).
//!
//! This crate contains the business rules of the product catalog: the
//! pagination plan, the soft-delete lifecycle and batch validation. Storage is
//! reached only through the [`ProductStore`] port; concrete databases live in
//! `catalog-infra`.

pub mod catalog;
pub mod pagination;
pub mod product;
pub mod store;

pub use catalog::{CatalogError, CatalogResult, ProductCatalog};
pub use pagination::{Page, PageMetadata, PagePlan, PageRequest, Slice};
pub use product::{NewProduct, Product, ProductChanges, ProductPatch};
pub use store::{InMemoryProductStore, ProductStore, StoreError, StoreResult};
