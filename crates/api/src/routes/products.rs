//! Product routes.
//!
//! Reads are open to any authenticated user; writes require admin or
//! manager.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use brightkit_core::ProductId;

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, LabSummary, Product, ProductDetail};
use crate::state::AppState;

/// Request body for creating or updating a product.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

fn require_catalog_writer(user: &CurrentUser) -> Result<()> {
    if user.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn validate(req: &ProductRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if req.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".to_string()));
    }
    Ok(())
}

/// List all products.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let catalog = CatalogRepository::new(state.pool());
    let products = catalog.list_products().await?;

    Ok(Json(products))
}

/// Get a product with its labs.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let catalog = CatalogRepository::new(state.pool());

    let product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let labs = catalog.labs_for_product(id).await?;

    Ok(Json(ProductDetail { product, labs }))
}

/// List the labs owned by a product.
///
/// GET /api/products/{id}/labs
///
/// # Errors
///
/// Returns 404 if the product doesn't exist.
pub async fn labs(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<LabSummary>>> {
    let catalog = CatalogRepository::new(state.pool());

    if catalog.get_product(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    let labs = catalog.labs_for_product(id).await?;

    Ok(Json(labs))
}

/// Create a product.
///
/// POST /api/products
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    require_catalog_writer(&user)?;
    validate(&req)?;

    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .create_product(&req.name, &req.description, req.price, req.stock)
        .await?;

    tracing::info!(product_id = %product.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
///
/// PUT /api/products/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager; 404 if missing.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>> {
    require_catalog_writer(&user)?;
    validate(&req)?;

    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .update_product(id, &req.name, &req.description, req.price, req.stock)
        .await?;

    Ok(Json(product))
}

/// Delete a product.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager; 404 if missing.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    require_catalog_writer(&user)?;

    let catalog = CatalogRepository::new(state.pool());
    if !catalog.delete_product(id).await? {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
