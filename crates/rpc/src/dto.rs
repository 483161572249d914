//! Request payloads and their validation.
//!
//! Payloads are whitelisted: unknown fields are rejected rather than ignored.
//! Validation happens here, before anything reaches the catalog.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use catalog_core::{DomainError, DomainResult, ProductId};
use catalog_products::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};
use catalog_products::{NewProduct, PageRequest, ProductChanges};

/// Maximum number of decimal places accepted for a price.
const PRICE_DECIMALS: i32 = 4;

/// Decode a payload, treating a missing/null payload as an empty object.
pub fn decode<T: DeserializeOwned>(data: Value) -> DomainResult<T> {
    let data = if data.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|e| DomainError::validation(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> DomainResult<NewProduct> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        Ok(NewProduct {
            description: self.description,
            available: self.available,
            ..NewProduct::new(self.name, self.price)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationRequest {
    pub fn into_page_request(self) -> DomainResult<PageRequest> {
        PageRequest::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductIdRequest {
    pub id: i64,
}

impl ProductIdRequest {
    pub fn into_id(self) -> DomainResult<ProductId> {
        validate_id(self.id)
    }
}

/// `{id, ...fields}`: `id` addresses the record; the rest is merged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> DomainResult<(ProductId, ProductChanges)> {
        let id = validate_id(self.id)?;
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok((
            id,
            ProductChanges {
                id: Some(id),
                name: self.name,
                price: self.price,
                description: self.description,
            },
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateProductsRequest {
    pub ids: Vec<i64>,
}

impl ValidateProductsRequest {
    pub fn into_ids(self) -> DomainResult<Vec<ProductId>> {
        if self.ids.is_empty() {
            return Err(DomainError::validation("ids must contain at least 1 element"));
        }
        self.ids.into_iter().map(validate_id).collect()
    }
}

fn validate_id(id: i64) -> DomainResult<ProductId> {
    let id = ProductId::new(id);
    if !id.is_valid() {
        return Err(DomainError::validation("id must be a positive number"));
    }
    Ok(id)
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name should not be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() {
        return Err(DomainError::validation("price must be a number"));
    }
    if price < 0.0 {
        return Err(DomainError::validation("price must not be less than 0"));
    }
    let scaled = price * 10f64.powi(PRICE_DECIMALS);
    if (scaled - scaled.round()).abs() > 1e-6 {
        return Err(DomainError::validation(format!(
            "price must have at most {PRICE_DECIMALS} decimal places"
        )));
    }
    Ok(())
}
