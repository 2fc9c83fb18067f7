//! Catalog repository: products and labs.

use rust_decimal::Decimal;
use sqlx::PgPool;

use brightkit_core::{LabId, LabStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Lab, LabSummary, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";

const LAB_COLUMNS: &str =
    "id, title, description, content, product_id, author_id, status, created_at, updated_at";

const LAB_SUMMARY_COLUMNS: &str =
    "id, title, description, product_id, status, created_at, updated_at";

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        stock: i32,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, stock)
             VALUES ($1, $2, $3, $4)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        name: &str,
        description: &str,
        price: Decimal,
        stock: i32,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET name = $2, description = $3, price = $4, stock = $5, updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Labs
    // =========================================================================

    /// List labs owned by a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn labs_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<LabSummary>, RepositoryError> {
        let labs = sqlx::query_as::<_, LabSummary>(&format!(
            "SELECT {LAB_SUMMARY_COLUMNS} FROM labs
             WHERE product_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(labs)
    }

    /// List all labs (staff view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_labs(&self) -> Result<Vec<LabSummary>, RepositoryError> {
        let labs = sqlx::query_as::<_, LabSummary>(&format!(
            "SELECT {LAB_SUMMARY_COLUMNS} FROM labs ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(labs)
    }

    /// List the labs visible to a customer: published labs whose product sits
    /// on one of the customer's orders with `labs_activated` set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_labs_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<LabSummary>, RepositoryError> {
        let labs = sqlx::query_as::<_, LabSummary>(&format!(
            "SELECT DISTINCT l.id, l.title, l.description, l.product_id, l.status,
                    l.created_at, l.updated_at
             FROM labs l
             JOIN order_items oi ON oi.product_id = l.product_id AND oi.labs_activated
             JOIN orders o ON o.id = oi.order_id
             WHERE l.status = $1 AND o.customer_id = $2
             ORDER BY l.created_at DESC"
        ))
        .bind(LabStatus::Published)
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(labs)
    }

    /// Whether a customer has unlocked a specific lab.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_can_access_lab(
        &self,
        lab_id: LabId,
        customer_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let unlocked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1
                 FROM labs l
                 JOIN order_items oi ON oi.product_id = l.product_id AND oi.labs_activated
                 JOIN orders o ON o.id = oi.order_id
                 WHERE l.id = $1 AND l.status = $2 AND o.customer_id = $3
             )",
        )
        .bind(lab_id)
        .bind(LabStatus::Published)
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(unlocked)
    }

    /// Get a lab by ID, including its content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_lab(&self, id: LabId) -> Result<Option<Lab>, RepositoryError> {
        let lab = sqlx::query_as::<_, Lab>(&format!(
            "SELECT {LAB_COLUMNS} FROM labs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(lab)
    }

    /// Create a lab.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_lab(
        &self,
        title: &str,
        description: &str,
        content: &str,
        product_id: Option<ProductId>,
        author_id: UserId,
        status: LabStatus,
    ) -> Result<Lab, RepositoryError> {
        let lab = sqlx::query_as::<_, Lab>(&format!(
            "INSERT INTO labs (title, description, content, product_id, author_id, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LAB_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(content)
        .bind(product_id)
        .bind(author_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(lab)
    }

    /// Update a lab.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the lab doesn't exist.
    pub async fn update_lab(
        &self,
        id: LabId,
        title: &str,
        description: &str,
        content: &str,
        product_id: Option<ProductId>,
        status: LabStatus,
    ) -> Result<Lab, RepositoryError> {
        sqlx::query_as::<_, Lab>(&format!(
            "UPDATE labs
             SET title = $2, description = $3, content = $4, product_id = $5,
                 status = $6, updated_at = now()
             WHERE id = $1
             RETURNING {LAB_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(content)
        .bind(product_id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a lab. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_lab(&self, id: LabId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM labs WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
