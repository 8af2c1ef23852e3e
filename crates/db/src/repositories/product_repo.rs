//! Repository for the `products` table.

use sqlx::PgPool;
use stockwatch_core::types::DbId;

use crate::models::product::{CreateProduct, LowStockRow, Product, ProductFilter, UpdateProduct};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, sku, stock, threshold, created_at, updated_at";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, sku, stock, threshold)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.sku)
            .bind(input.stock)
            .bind(input.threshold)
            .fetch_one(pool)
            .await
    }

    /// Find a product by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List products ordered by ID, optionally filtered.
    pub async fn list(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR sku ILIKE $1)
               AND ($2 = false OR stock < threshold)
             ORDER BY id"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(pattern)
            .bind(filter.below_threshold)
            .fetch_all(pool)
            .await
    }

    /// List every product with `stock < threshold`, emptiest first.
    pub async fn list_low_stock(pool: &PgPool) -> Result<Vec<LowStockRow>, sqlx::Error> {
        sqlx::query_as::<_, LowStockRow>(
            "SELECT id, name, sku, stock, threshold FROM products
             WHERE stock < threshold
             ORDER BY stock, id",
        )
        .fetch_all(pool)
        .await
    }

    /// Update a product, returning the previous and the updated row.
    ///
    /// Only non-`None` fields in `input` are applied. The previous row is
    /// read under `FOR UPDATE` in the same transaction so the pair is
    /// consistent. Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<(Product, Product)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let Some(previous) = sqlx::query_as::<_, Product>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let update = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                stock = COALESCE($4, stock),
                threshold = COALESCE($5, threshold)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Product>(&update)
            .bind(id)
            .bind(&input.name)
            .bind(&input.sku)
            .bind(input.stock)
            .bind(input.threshold)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((previous, updated)))
    }

    /// Delete a product by ID, returning the removed row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("DELETE FROM products WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
