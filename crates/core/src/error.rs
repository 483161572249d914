//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures that callers
/// are expected to branch on. Storage failures belong elsewhere and are never
/// folded into this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("{0}")]
    Validation(String),

    /// No *available* product exists for the requested id.
    ///
    /// Missing records and soft-deleted records are indistinguishable here.
    #[error("Product with id {id} not found")]
    NotFound { id: ProductId },

    /// Batch validation could not account for every distinct requested id.
    #[error("Some products were not found")]
    SomeNotFound { missing: Vec<ProductId> },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: ProductId) -> Self {
        Self::NotFound { id }
    }

    pub fn some_not_found(mut missing: Vec<ProductId>) -> Self {
        missing.sort_unstable();
        Self::SomeNotFound { missing }
    }
}
