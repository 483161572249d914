//! `catalog-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog crates
//! (identifiers and the domain error model). No infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::ProductId;
