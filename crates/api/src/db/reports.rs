//! Read-only reporting queries: counts and sums grouped by date or status.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use brightkit_core::{OrderStatus, TicketStatus};

use super::RepositoryError;

/// One day of sales: order count and revenue.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SalesReportRow {
    pub date: NaiveDate,
    pub total: Decimal,
    pub orders: i64,
}

/// One day of support activity: tickets opened and tickets resolved.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SupportReportRow {
    pub date: NaiveDate,
    pub tickets: i64,
    pub resolved: i64,
}

/// Order count for one pipeline status.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DeliveryReportRow {
    pub status: OrderStatus,
    pub count: i64,
}

/// Repository for reporting queries.
pub struct ReportsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportsRepository<'a> {
    /// Create a new reports repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Per-day order totals over an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_day(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<SalesReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SalesReportRow>(
            "SELECT created_at::date AS date,
                    SUM(total_amount) AS total,
                    COUNT(*) AS orders
             FROM orders
             WHERE created_at::date BETWEEN $1 AND $2
             GROUP BY created_at::date
             ORDER BY date",
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-day ticket counts over an inclusive date range, with how many of
    /// each day's tickets are currently resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn support_by_day(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<SupportReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SupportReportRow>(
            "SELECT created_at::date AS date,
                    COUNT(*) AS tickets,
                    COUNT(*) FILTER (WHERE status = $3) AS resolved
             FROM support_tickets
             WHERE created_at::date BETWEEN $1 AND $2
             GROUP BY created_at::date
             ORDER BY date",
        )
        .bind(start_date)
        .bind(end_date)
        .bind(TicketStatus::Resolved)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Order counts per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(&self) -> Result<Vec<DeliveryReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryReportRow>(
            "SELECT status, COUNT(*) AS count
             FROM orders
             GROUP BY status
             ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
