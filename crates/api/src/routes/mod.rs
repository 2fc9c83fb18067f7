//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (DB)
//!
//! # Auth
//! POST /api/auth/register              - Create a customer account
//! POST /api/auth/login                 - Session login
//! POST /api/auth/logout                - Session logout
//! GET  /api/auth/me                    - Current user
//!
//! # Products
//! GET  /api/products                   - Product listing
//! POST /api/products                   - Create (admin/manager)
//! GET  /api/products/{id}              - Product detail with labs
//! PUT  /api/products/{id}              - Update (admin/manager)
//! DELETE /api/products/{id}            - Delete (admin/manager)
//! GET  /api/products/{id}/labs         - Labs owned by a product
//!
//! # Labs
//! GET  /api/labs                       - Listing (customers: unlocked only)
//! POST /api/labs                       - Create (admin/manager)
//! GET  /api/labs/{id}                  - Detail with content
//! PUT  /api/labs/{id}                  - Update (admin/manager)
//! DELETE /api/labs/{id}                - Delete (admin/manager)
//!
//! # Orders
//! GET  /api/orders                     - Listing (role-scoped)
//! POST /api/orders                     - Place an order
//! GET  /api/orders/{id}                - Order detail
//! POST /api/orders/{id}/status         - Status update (staff+); `delivered`
//!                                        activates labs on all line items
//!
//! # Support
//! GET  /api/support/tickets            - Ticket queue (role-scoped)
//! POST /api/support/tickets            - Open a ticket
//! GET  /api/support/tickets/{id}       - Ticket with message thread
//! POST /api/support/tickets/{id}/messages - Append a message
//! POST /api/support/tickets/{id}/assign   - Self-assign (staff+)
//! POST /api/support/tickets/{id}/status   - Status update (staff+)
//! GET  /api/support/lab-support        - Session log (role-scoped)
//! POST /api/support/lab-support        - Log a session (quota-checked)
//! GET  /api/support/lab-support/{id}   - Session detail
//! POST /api/support/lab-support/{id}/resolve - Mark resolved
//! GET  /api/support/lab-support/statistics   - Aggregates (staff+)
//! CRUD /api/support/lab-support-limits - Quota records (writes admin/staff)
//!
//! # Reports
//! GET  /api/reports/sales              - Per-day sales
//! GET  /api/reports/support            - Per-day ticket counts
//! GET  /api/reports/delivery           - Orders by status
//! ```

pub mod auth;
pub mod labs;
pub mod orders;
pub mod products;
pub mod reports;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/labs", get(products::labs))
}

/// Create the lab routes router.
pub fn lab_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(labs::index).post(labs::create))
        .route(
            "/{id}",
            get(labs::show).put(labs::update).delete(labs::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the support routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tickets",
            get(support::list_tickets).post(support::create_ticket),
        )
        .route("/tickets/{id}", get(support::show_ticket))
        .route("/tickets/{id}/messages", post(support::add_message))
        .route("/tickets/{id}/assign", post(support::assign_staff))
        .route("/tickets/{id}/status", post(support::update_ticket_status))
        // `statistics` before `{id}` so the literal segment wins
        .route(
            "/lab-support/statistics",
            get(support::statistics),
        )
        .route(
            "/lab-support",
            get(support::list_supports).post(support::create_support),
        )
        .route("/lab-support/{id}", get(support::show_support))
        .route("/lab-support/{id}/resolve", post(support::resolve_support))
        .route(
            "/lab-support-limits",
            get(support::list_limits).post(support::create_limit),
        )
        .route(
            "/lab-support-limits/{id}",
            get(support::show_limit)
                .put(support::update_limit)
                .delete(support::delete_limit),
        )
}

/// Create the report routes router.
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(reports::sales))
        .route("/support", get(reports::support))
        .route("/delivery", get(reports::delivery))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/labs", lab_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/support", support_routes())
        .nest("/api/reports", report_routes())
}
