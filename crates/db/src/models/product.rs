//! Product entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockwatch_core::stock::{LowStockItem, StockChangeEvent};
use stockwatch_core::types::{DbId, Timestamp};

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub threshold: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    /// Build the post-commit stock change fact for this row.
    pub fn stock_change_event(&self) -> StockChangeEvent {
        StockChangeEvent::new(self.id, &self.sku, &self.name, self.stock, self.threshold)
    }
}

/// DTO for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub sku: String,
    /// Defaults to 0 if omitted.
    #[serde(default)]
    pub stock: i32,
    /// Defaults to 0 if omitted.
    #[serde(default)]
    pub threshold: i32,
}

/// DTO for updating an existing product. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    pub threshold: Option<i32>,
}

/// Filters for the product list query.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name or SKU.
    pub search: Option<String>,
    /// Only rows with `stock < threshold`.
    pub below_threshold: bool,
}

/// Projection of `products` used by low-stock reports.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LowStockRow {
    pub id: DbId,
    pub name: String,
    pub sku: String,
    pub stock: i32,
    pub threshold: i32,
}

impl From<LowStockRow> for LowStockItem {
    fn from(row: LowStockRow) -> Self {
        LowStockItem {
            id: row.id,
            name: row.name,
            sku: row.sku,
            stock: row.stock,
            threshold: row.threshold,
        }
    }
}
