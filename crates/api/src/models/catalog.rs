//! Catalog domain types: products and the labs they own.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use brightkit_core::{LabId, LabStatus, ProductId, UserId};

/// A purchasable STEM kit.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product detail response with the labs it unlocks.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub labs: Vec<LabSummary>,
}

/// A full lab row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lab {
    pub id: LabId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub product_id: Option<ProductId>,
    pub author_id: Option<UserId>,
    pub status: LabStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lab listing shape. Omits `content`; that is only unlocked on the detail
/// endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LabSummary {
    pub id: LabId,
    pub title: String,
    pub description: String,
    pub product_id: Option<ProductId>,
    pub status: LabStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lab detail response, including content and the owning product.
#[derive(Debug, Serialize)]
pub struct LabDetail {
    pub id: LabId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub product: Option<Product>,
    pub status: LabStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabDetail {
    /// Combine a lab row with its (optional) product.
    #[must_use]
    pub fn from_parts(lab: Lab, product: Option<Product>) -> Self {
        Self {
            id: lab.id,
            title: lab.title,
            description: lab.description,
            content: lab.content,
            product,
            status: lab.status,
            created_at: lab.created_at,
            updated_at: lab.updated_at,
        }
    }
}

impl From<&Lab> for LabSummary {
    fn from(lab: &Lab) -> Self {
        Self {
            id: lab.id,
            title: lab.title.clone(),
            description: lab.description.clone(),
            product_id: lab.product_id,
            status: lab.status,
            created_at: lab.created_at,
            updated_at: lab.updated_at,
        }
    }
}
