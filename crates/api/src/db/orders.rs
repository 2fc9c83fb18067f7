//! Order repository: orders, line items, and the delivery transition.

use sqlx::PgPool;

use brightkit_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItemWithProduct, line_total, order_total};

const ORDER_COLUMNS: &str =
    "id, customer_id, status, total_amount, shipping_address, created_at, updated_at";

/// Columns for an order item joined with its product. Aliases keep the
/// item's snapshot `price` distinct from the product's current `unit_price`.
const ITEM_WITH_PRODUCT_COLUMNS: &str = "oi.id, oi.quantity, oi.price, oi.labs_activated,
     p.id AS product_id, p.name, p.description, p.price AS unit_price, p.stock,
     p.created_at AS product_created_at, p.updated_at AS product_updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every order (admin/manager view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// List orders that have entered fulfilment (staff view excludes
    /// `pending`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_excluding_pending(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status <> $1 ORDER BY created_at DESC"
        ))
        .bind(OrderStatus::Pending)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// List a customer's own orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order's line items joined with their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_with_products(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemWithProduct>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemWithProduct>(&format!(
            "SELECT {ITEM_WITH_PRODUCT_COLUMNS}
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id
             WHERE oi.order_id = $1
             ORDER BY oi.id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Create an order with its line items in one transaction.
    ///
    /// Each line's `price` is snapshotted as unit price x quantity at order
    /// time, and `total_amount` is the sum of those snapshots. The total is
    /// never recomputed afterwards, even if product prices change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a referenced product doesn't
    /// exist. Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        customer_id: UserId,
        shipping_address: &str,
        items: &[(ProductId, i32)],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query_scalar::<_, OrderId>(
            "INSERT INTO orders (customer_id, shipping_address, total_amount)
             VALUES ($1, $2, 0)
             RETURNING id",
        )
        .bind(customer_id)
        .bind(shipping_address)
        .fetch_one(&mut *tx)
        .await?;

        let mut line_totals = Vec::with_capacity(items.len());
        for &(product_id, quantity) in items {
            let unit_price = sqlx::query_scalar::<_, rust_decimal::Decimal>(
                "SELECT price FROM products WHERE id = $1",
            )
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            let price = line_total(unit_price, quantity);
            line_totals.push(price);

            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET total_amount = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(order_total(&line_totals))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Update an order's status. When the new status is `delivered`, every
    /// line item's `labs_activated` flag is set in one batch update first.
    /// The two statements are deliberately not wrapped in a transaction;
    /// each relies on Postgres statement atomicity only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        if status == OrderStatus::Delivered {
            sqlx::query("UPDATE order_items SET labs_activated = TRUE WHERE order_id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;
        }

        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
