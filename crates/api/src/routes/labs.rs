//! Lab routes.
//!
//! Writes require admin or manager. Customers only see published labs that
//! their delivered orders have unlocked; the detail endpoint is where lab
//! content is served, so the same unlock check gates it.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use brightkit_core::{LabId, LabStatus, ProductId, Role};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, LabDetail, LabSummary};
use crate::state::AppState;

/// Request body for creating or updating a lab.
#[derive(Debug, Deserialize)]
pub struct LabRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub status: LabStatus,
}

fn require_catalog_writer(user: &CurrentUser) -> Result<()> {
    if user.role.can_manage_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// List labs. Customers get only the labs they have unlocked.
///
/// GET /api/labs
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<LabSummary>>> {
    let catalog = CatalogRepository::new(state.pool());

    let labs = if user.role == Role::Customer {
        catalog.list_labs_for_customer(user.id).await?
    } else {
        catalog.list_labs().await?
    };

    Ok(Json(labs))
}

/// Get a lab with its content and product.
///
/// GET /api/labs/{id}
///
/// # Errors
///
/// Returns 404 if the lab doesn't exist or the customer hasn't unlocked it.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabId>,
) -> Result<Json<LabDetail>> {
    let catalog = CatalogRepository::new(state.pool());

    let lab = catalog
        .get_lab(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lab {id}")))?;

    // Locked labs are indistinguishable from missing ones for customers
    if user.role == Role::Customer && !catalog.customer_can_access_lab(id, user.id).await? {
        return Err(AppError::NotFound(format!("lab {id}")));
    }

    let product = match lab.product_id {
        Some(product_id) => catalog.get_product(product_id).await?,
        None => None,
    };

    Ok(Json(LabDetail::from_parts(lab, product)))
}

/// Create a lab.
///
/// POST /api/labs
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<LabRequest>,
) -> Result<(StatusCode, Json<LabDetail>)> {
    require_catalog_writer(&user)?;

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let catalog = CatalogRepository::new(state.pool());

    if let Some(product_id) = req.product_id
        && catalog.get_product(product_id).await?.is_none()
    {
        return Err(AppError::BadRequest(format!("product {product_id} does not exist")));
    }

    let lab = catalog
        .create_lab(
            &req.title,
            &req.description,
            &req.content,
            req.product_id,
            user.id,
            req.status,
        )
        .await?;

    let product = match lab.product_id {
        Some(product_id) => catalog.get_product(product_id).await?,
        None => None,
    };

    tracing::info!(lab_id = %lab.id, "lab created");

    Ok((StatusCode::CREATED, Json(LabDetail::from_parts(lab, product))))
}

/// Update a lab.
///
/// PUT /api/labs/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager; 404 if missing.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabId>,
    Json(req): Json<LabRequest>,
) -> Result<Json<LabDetail>> {
    require_catalog_writer(&user)?;

    let catalog = CatalogRepository::new(state.pool());
    let lab = catalog
        .update_lab(
            id,
            &req.title,
            &req.description,
            &req.content,
            req.product_id,
            req.status,
        )
        .await?;

    let product = match lab.product_id {
        Some(product_id) => catalog.get_product(product_id).await?,
        None => None,
    };

    Ok(Json(LabDetail::from_parts(lab, product)))
}

/// Delete a lab.
///
/// DELETE /api/labs/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or manager; 404 if missing.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabId>,
) -> Result<StatusCode> {
    require_catalog_writer(&user)?;

    let catalog = CatalogRepository::new(state.pool());
    if !catalog.delete_lab(id).await? {
        return Err(AppError::NotFound(format!("lab {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
