use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::ProductId;

/// A persisted product record.
///
/// `available = false` marks the record as logically deleted. Such records stay
/// in the store but are invisible to every read exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a product. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    /// Passed through when present; otherwise the store default (`true`) applies.
    pub available: Option<bool>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }
}

/// Caller-supplied changes for an update.
///
/// `id` mirrors whatever the caller sent alongside the fields; it is never
/// applied to the record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductChanges {
    pub id: Option<ProductId>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl ProductChanges {
    /// Drop the id and keep the mergeable fields.
    pub fn into_patch(self) -> ProductPatch {
        let Self {
            id: _,
            name,
            price,
            description,
        } = self;
        ProductPatch {
            name,
            price,
            description,
            available: None,
        }
    }
}

/// Partial update applied by the store. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

impl ProductPatch {
    /// The patch used by soft delete.
    pub fn mark_unavailable() -> Self {
        Self {
            available: Some(false),
            ..Self::default()
        }
    }

    /// Merge into an existing record, bumping `updated_at`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        product.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: "Keyboard".to_string(),
            price: 49.5,
            description: None,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn changes_drop_the_caller_id() {
        let changes = ProductChanges {
            id: Some(ProductId::new(99)),
            name: Some("X".to_string()),
            ..ProductChanges::default()
        };

        let patch = changes.into_patch();
        assert_eq!(patch.name.as_deref(), Some("X"));
        assert!(patch.price.is_none());
        assert!(patch.available.is_none());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut product = sample(1);
        let before = product.clone();
        let patch = ProductPatch {
            price: Some(10.0),
            ..ProductPatch::default()
        };

        patch.apply_to(&mut product, Utc::now());

        assert_eq!(product.id, before.id);
        assert_eq!(product.name, before.name);
        assert_eq!(product.price, 10.0);
        assert!(product.available);
    }

    #[test]
    fn mark_unavailable_only_touches_the_flag() {
        let patch = ProductPatch::mark_unavailable();
        assert_eq!(patch.available, Some(false));
        assert!(patch.name.is_none() && patch.price.is_none() && patch.description.is_none());
    }

    #[test]
    fn product_serializes_in_camel_case() {
        let json = serde_json::to_value(sample(3)).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["available"], true);
    }
}
