//! Shared query parameter types for API handlers.

use serde::Deserialize;
use stockwatch_db::models::product::ProductFilter;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Requested limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Requested offset, never negative.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Query parameters for `GET /products` (`?q=&below=threshold`).
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    /// Case-insensitive search on name or SKU.
    pub q: Option<String>,
    /// `threshold` restricts the listing to low-stock rows.
    pub below: Option<String>,
}

impl From<ProductListParams> for ProductFilter {
    fn from(params: ProductListParams) -> Self {
        ProductFilter {
            search: params.q.filter(|q| !q.trim().is_empty()),
            below_threshold: params.below.as_deref() == Some("threshold"),
        }
    }
}
