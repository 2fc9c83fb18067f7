//! Order domain types and total computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use brightkit_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::catalog::Product;
use super::user::UserPublic;

/// An order row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order item joined with its product, as read back from the database.
///
/// Column aliases in the query distinguish the item's snapshot `price`
/// (a line total) from the product's current `unit_price`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemWithProduct {
    pub id: OrderItemId,
    pub quantity: i32,
    pub price: Decimal,
    pub labs_activated: bool,
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub stock: i32,
    pub product_created_at: DateTime<Utc>,
    pub product_updated_at: DateTime<Utc>,
}

impl OrderItemWithProduct {
    /// Split into the client-facing item shape.
    #[must_use]
    pub fn into_response(self) -> OrderItemResponse {
        OrderItemResponse {
            id: self.id,
            product: Product {
                id: self.product_id,
                name: self.name,
                description: self.description,
                price: self.unit_price,
                stock: self.stock,
                created_at: self.product_created_at,
                updated_at: self.product_updated_at,
            },
            quantity: self.quantity,
            price: self.price,
            labs_activated: self.labs_activated,
        }
    }
}

/// Client-facing order item.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: i32,
    /// Line total snapshot taken at order time.
    pub price: Decimal,
    pub labs_activated: bool,
}

/// Client-facing order with customer and line items.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer: UserPublic,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

/// Line total for one order item: unit price at order time times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Order total: the sum of the line totals. Computed exactly once, when the
/// order is created.
#[must_use]
pub fn order_total(line_totals: &[Decimal]) -> Decimal {
    line_totals.iter().copied().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(d("49.99"), 2), d("99.98"));
        assert_eq!(line_total(d("29.99"), 1), d("29.99"));
        assert_eq!(line_total(d("199.99"), 0), d("0.00"));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![
            line_total(d("49.99"), 2),
            line_total(d("89.99"), 1),
            line_total(d("39.99"), 3),
        ];
        assert_eq!(order_total(&lines), d("309.94"));
    }

    #[test]
    fn test_order_total_empty_is_zero() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
