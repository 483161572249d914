//! Postgres-backed product store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Io / Tls / PoolTimedOut / PoolClosed / Configuration | `Connection` |
//! | ColumnDecode / Decode / ColumnNotFound / TypeNotFound | `Decode` |
//! | Database / anything else | `Query` |
//!
//! ## Thread Safety
//!
//! `PostgresProductStore` is `Send + Sync`; all access goes through the SQLx pool.
//! No operation opens an explicit transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product, ProductPatch, ProductStore, StoreError, StoreResult};

const SCHEMA_SQL: &str = include_str!("schema.sql");

const PRODUCT_COLUMNS: &str = "id, name, price, description, available, created_at, updated_at";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Postgres-backed product store.
///
/// The pool is created lazily; `connect()` performs the first round trip and
/// bootstraps the `products` table.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Build a store from a connection string without touching the network.
    pub fn from_url(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_lazy(database_url)
            .map_err(|e| map_sqlx_error("configure_pool", e))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), err)]
    async fn connect(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        info!("connected to database");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }

    #[instrument(skip(self, product), err)]
    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let sql = format!(
            "INSERT INTO products (name, price, description, available) \
             VALUES ($1, $2, $3, COALESCE($4, TRUE)) \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.description)
            .bind(product.available)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn get_available(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND available = TRUE");

        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_available", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, patch), fields(id = %id), err)]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let sql = format!(
            "UPDATE products SET \
                 name = COALESCE($2, name), \
                 price = COALESCE($3, price), \
                 description = COALESCE($4, description), \
                 available = COALESCE($5, available), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(patch.name)
            .bind(patch.price)
            .bind(patch.description)
            .bind(patch.available)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => Err(StoreError::MissingRecord(id)),
        }
    }

    #[instrument(skip(self), err)]
    async fn count_available(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE available = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_available", e))?;

        u64::try_from(count).map_err(|e| StoreError::Decode(format!("count: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn find_available(&self, skip: u64, take: u64) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE available = TRUE \
             ORDER BY id ASC \
             OFFSET $1 LIMIT $2"
        );

        let rows = sqlx::query(&sql)
            .bind(to_i64("skip", skip)?)
            .bind(to_i64("take", take)?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_available", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, ids), fields(id_count = ids.len()), err)]
    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE available = TRUE AND id = ANY($1) \
             ORDER BY id ASC"
        );
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let rows = sqlx::query(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_available_by_ids", e))?;

        rows.iter().map(product_from_row).collect()
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_product", e);

    Ok(Product {
        id: ProductId::new(row.try_get::<i64, _>("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        available: row.try_get("available").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

fn to_i64(field: &str, value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|e| StoreError::Query(format!("{field} out of range: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => {
            StoreError::Connection(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(format!("{operation}: {err}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Query(format!("database error in {operation}: {}", db_err.message()))
        }
        other => StoreError::Query(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_map_to_connection_failures() {
        assert!(matches!(
            map_sqlx_error("connect", sqlx::Error::PoolTimedOut),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            map_sqlx_error("connect", sqlx::Error::PoolClosed),
            StoreError::Connection(_)
        ));
    }

    #[test]
    fn decode_errors_map_to_decode() {
        let missing = sqlx::Error::ColumnNotFound("price".to_string());
        let err = map_sqlx_error("decode_product", missing);
        match err {
            StoreError::Decode(msg) => assert!(msg.contains("decode_product")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn other_errors_map_to_query() {
        assert!(matches!(
            map_sqlx_error("update", sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }

    #[test]
    fn offsets_beyond_i64_are_rejected() {
        assert_eq!(to_i64("skip", 40).unwrap(), 40);
        assert!(matches!(to_i64("skip", u64::MAX), Err(StoreError::Query(_))));
    }

    #[test]
    fn schema_bootstraps_products_table() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS products"));
        assert!(SCHEMA_SQL.contains("available   BOOLEAN NOT NULL DEFAULT TRUE"));
    }

    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let err = PostgresProductStore::from_url("not a url").unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
