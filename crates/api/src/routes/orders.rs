//! Order routes: placement, role-scoped listing, and the delivery
//! transition that unlocks labs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use sqlx::PgPool;

use brightkit_core::{OrderId, OrderStatus, ProductId, Role};

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Order, OrderItemWithProduct, OrderResponse};
use crate::state::AppState;

/// One requested line item.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request body for placing an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub shipping_address: String,
    pub items: Vec<OrderItemRequest>,
}

/// Request body for a status update. `status` is optional so a missing
/// field produces the designed 400 rather than a deserialization error.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Assemble the client-facing order shape.
async fn order_response(pool: &PgPool, order: Order) -> Result<OrderResponse> {
    let orders = OrderRepository::new(pool);
    let users = UserRepository::new(pool);

    let customer = users.public_by_id(order.customer_id).await?;
    let items = orders
        .items_with_products(order.id)
        .await?
        .into_iter()
        .map(OrderItemWithProduct::into_response)
        .collect();

    Ok(OrderResponse {
        id: order.id,
        customer,
        status: order.status,
        total_amount: order.total_amount,
        shipping_address: order.shipping_address,
        created_at: order.created_at,
        updated_at: order.updated_at,
        items,
    })
}

/// Whether a user may see a specific order.
fn can_view(user: &CurrentUser, order: &Order) -> bool {
    order.customer_id == user.id || user.role.is_staff_or_above()
}

/// List orders, scoped by role: admin/manager see everything, staff see
/// everything past `pending`, customers see their own.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let repo = OrderRepository::new(state.pool());

    let orders = match user.role {
        Role::Admin | Role::Manager => repo.list_all().await?,
        Role::Staff => repo.list_excluding_pending().await?,
        Role::Customer => repo.list_for_customer(user.id).await?,
    };

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        responses.push(order_response(state.pool(), order).await?);
    }

    Ok(Json(responses))
}

/// Get one order.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 if missing, 403 if the caller is neither owner nor staff.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    if !can_view(&user, &order) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(order_response(state.pool(), order).await?))
}

/// Place an order. The total is computed here, once, from current product
/// prices; later price changes never touch existing orders.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns 400 for an empty cart or non-positive quantity, 404 for an
/// unknown product.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    if req.items.is_empty() {
        return Err(AppError::BadRequest("order must contain at least one item".to_string()));
    }
    if req.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest("quantity must be positive".to_string()));
    }

    let items: Vec<(ProductId, i32)> = req
        .items
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();

    let repo = OrderRepository::new(state.pool());
    let order = repo.create(user.id, &req.shipping_address, &items).await?;

    tracing::info!(order_id = %order.id, customer_id = %user.id, "order placed");

    Ok((
        StatusCode::CREATED,
        Json(order_response(state.pool(), order).await?),
    ))
}

/// Update an order's status (staff and above). Moving to `delivered`
/// batch-activates labs on every line item before the status is written.
///
/// POST /api/orders/{id}/status
///
/// # Errors
///
/// Returns 400 for a missing or unknown status value, 403 for
/// insufficient role, 404 for a missing order.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let Some(raw) = req.status else {
        return Err(AppError::BadRequest("Status is required".to_string()));
    };

    let status: OrderStatus = raw
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".to_string()))?;

    if !user.role.is_staff_or_above() {
        return Err(AppError::Forbidden);
    }

    let repo = OrderRepository::new(state.pool());
    let order = repo.set_status(id, status).await?;

    if status == OrderStatus::Delivered {
        tracing::info!(order_id = %id, "order delivered, labs activated");
    }

    Ok(Json(order_response(state.pool(), order).await?))
}
