//! Handlers for the `/products` resource.
//!
//! Every mutation that changes stock publishes a [`StockChangeEvent`] on the
//! event bus after the write commits. The response never waits on the
//! notification work that follows.
//!
//! [`StockChangeEvent`]: stockwatch_core::stock::StockChangeEvent

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use stockwatch_core::error::CoreError;
use stockwatch_core::types::DbId;
use stockwatch_db::models::product::{CreateProduct, Product, UpdateProduct};
use stockwatch_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::query::ProductListParams;
use crate::state::AppState;

/// POST /api/v1/products
pub async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    validate_create(&input)?;

    let product = ProductRepo::create(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, sku = %product.sku, "Product created");

    state.event_bus.publish(product.stock_change_event());
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/v1/products
pub async fn list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<Vec<Product>>> {
    let products = ProductRepo::list(&state.pool, &params.into()).await?;
    Ok(Json(products))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Product>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(product))
}

/// PUT /api/v1/products/{id}
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<Product>> {
    validate_update(&input)?;

    let (previous, product) = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;

    if previous.stock != product.stock {
        tracing::debug!(
            product_id = id,
            from = previous.stock,
            to = product.stock,
            "Stock changed"
        );
        state.event_bus.publish(product.stock_change_event());
    }

    Ok(Json(product))
}

/// DELETE /api/v1/products/{id}
pub async fn delete(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Product>> {
    let product = ProductRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    tracing::info!(product_id = id, "Product deleted");
    Ok(Json(product))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_create(input: &CreateProduct) -> Result<(), CoreError> {
    if input.name.trim().is_empty() || input.sku.trim().is_empty() {
        return Err(CoreError::Validation("Name and SKU are required".into()));
    }
    validate_levels(Some(input.stock), Some(input.threshold))
}

fn validate_update(input: &UpdateProduct) -> Result<(), CoreError> {
    let blank = |field: &Option<String>| field.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&input.name) || blank(&input.sku) {
        return Err(CoreError::Validation("Name and SKU cannot be empty".into()));
    }
    validate_levels(input.stock, input.threshold)
}

fn validate_levels(stock: Option<i32>, threshold: Option<i32>) -> Result<(), CoreError> {
    if stock.is_some_and(|s| s < 0) || threshold.is_some_and(|t| t < 0) {
        return Err(CoreError::Validation(
            "Stock and threshold must be non-negative".into(),
        ));
    }
    Ok(())
}
