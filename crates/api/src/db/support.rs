//! Support repository: tickets, message threads, lab-support sessions, and
//! per-lab quotas.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use brightkit_core::{
    LabId, LabSupportId, LabSupportLimitId, MessageId, SupportType, TicketId, TicketStatus, UserId,
};

use super::RepositoryError;
use crate::models::support::{LabCount, StaffPerformance, SupportStatistics, TypeCount};
use crate::models::{
    LabSupport, LabSupportLimit, SupportMessageResponse, SupportTicket, UserPublic, quota_reached,
};

const TICKET_COLUMNS: &str =
    "id, title, description, user_id, lab_id, staff_id, status, created_at, updated_at";

const SUPPORT_COLUMNS: &str = "id, lab_id, customer_id, staff_id, support_type, description, \
     solution, duration_minutes, is_resolved, resolved_at, created_at";

const LIMIT_COLUMNS: &str = "id, lab_id, max_support_count, support_duration_limit";

/// A message row joined with its sender, flattened for `FromRow`.
#[derive(sqlx::FromRow)]
struct MessageWithSender {
    id: MessageId,
    message: String,
    created_at: DateTime<Utc>,
    sender_id: UserId,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: brightkit_core::Role,
    phone_number: String,
    address: String,
}

impl From<MessageWithSender> for SupportMessageResponse {
    fn from(row: MessageWithSender) -> Self {
        Self {
            id: row.id,
            message: row.message,
            created_at: row.created_at,
            sender: UserPublic {
                id: row.sender_id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                role: row.role,
                phone_number: row.phone_number,
                address: row.address,
            },
        }
    }
}

/// Repository for support database operations.
pub struct SupportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupportRepository<'a> {
    /// Create a new support repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Tickets
    // =========================================================================

    /// List every ticket (admin/staff queue).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_tickets_all(&self) -> Result<Vec<SupportTicket>, RepositoryError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(tickets)
    }

    /// List a user's own tickets.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_tickets_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SupportTicket>, RepositoryError> {
        let tickets = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets
             WHERE user_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tickets)
    }

    /// Get a ticket by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_ticket(&self, id: TicketId) -> Result<Option<SupportTicket>, RepositoryError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(ticket)
    }

    /// Open a ticket on behalf of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_ticket(
        &self,
        title: &str,
        description: &str,
        user_id: UserId,
        lab_id: LabId,
    ) -> Result<SupportTicket, RepositoryError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "INSERT INTO support_tickets (title, description, user_id, lab_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(user_id)
        .bind(lab_id)
        .fetch_one(self.pool)
        .await?;

        Ok(ticket)
    }

    /// Fetch a ticket's message thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn messages_for_ticket(
        &self,
        ticket_id: TicketId,
    ) -> Result<Vec<SupportMessageResponse>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageWithSender>(
            "SELECT m.id, m.message, m.created_at,
                    u.id AS sender_id, u.username, u.email, u.first_name, u.last_name,
                    u.role, u.phone_number, u.address
             FROM support_messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.ticket_id = $1
             ORDER BY m.created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Append a message to a ticket's thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_message(
        &self,
        ticket_id: TicketId,
        sender_id: UserId,
        message: &str,
    ) -> Result<(MessageId, DateTime<Utc>), RepositoryError> {
        let row = sqlx::query_as::<_, (MessageId, DateTime<Utc>)>(
            "INSERT INTO support_messages (ticket_id, sender_id, message)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(ticket_id)
        .bind(sender_id)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Assign a staff member to a ticket and move it to `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket doesn't exist.
    pub async fn assign_staff(
        &self,
        id: TicketId,
        staff_id: UserId,
    ) -> Result<SupportTicket, RepositoryError> {
        sqlx::query_as::<_, SupportTicket>(&format!(
            "UPDATE support_tickets
             SET staff_id = $2, status = $3, updated_at = now()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(staff_id)
        .bind(TicketStatus::InProgress)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Update a ticket's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket doesn't exist.
    pub async fn set_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<SupportTicket, RepositoryError> {
        sqlx::query_as::<_, SupportTicket>(&format!(
            "UPDATE support_tickets SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Lab support sessions
    // =========================================================================

    /// List every lab-support session (admin/staff view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_supports_all(&self) -> Result<Vec<LabSupport>, RepositoryError> {
        let supports = sqlx::query_as::<_, LabSupport>(&format!(
            "SELECT {SUPPORT_COLUMNS} FROM lab_supports ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(supports)
    }

    /// List the sessions where the user is the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_supports_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<LabSupport>, RepositoryError> {
        let supports = sqlx::query_as::<_, LabSupport>(&format!(
            "SELECT {SUPPORT_COLUMNS} FROM lab_supports
             WHERE customer_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(supports)
    }

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_support(
        &self,
        id: LabSupportId,
    ) -> Result<Option<LabSupport>, RepositoryError> {
        let support = sqlx::query_as::<_, LabSupport>(&format!(
            "SELECT {SUPPORT_COLUMNS} FROM lab_supports WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(support)
    }

    /// Create a lab-support session, enforcing the per-lab quota.
    ///
    /// The limit lookup, the count, and the insert run inside one
    /// transaction; without a limit row for the lab the quota is unlimited.
    /// The count-then-insert pair is not serializable, so two concurrent
    /// requests for the same (lab, customer) pair can both pass the check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::QuotaExceeded` when the customer has used
    /// up the lab's `max_support_count`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_support(
        &self,
        lab_id: LabId,
        customer_id: UserId,
        staff_id: Option<UserId>,
        support_type: SupportType,
        description: &str,
        solution: &str,
        duration_minutes: i32,
    ) -> Result<LabSupport, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let max_support_count = sqlx::query_scalar::<_, i32>(
            "SELECT max_support_count FROM lab_support_limits WHERE lab_id = $1",
        )
        .bind(lab_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(max) = max_support_count {
            let used = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM lab_supports WHERE lab_id = $1 AND customer_id = $2",
            )
            .bind(lab_id)
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;

            if quota_reached(max, used) {
                return Err(RepositoryError::QuotaExceeded);
            }
        }

        let support = sqlx::query_as::<_, LabSupport>(&format!(
            "INSERT INTO lab_supports
                 (lab_id, customer_id, staff_id, support_type, description, solution, duration_minutes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SUPPORT_COLUMNS}"
        ))
        .bind(lab_id)
        .bind(customer_id)
        .bind(staff_id)
        .bind(support_type)
        .bind(description)
        .bind(solution)
        .bind(duration_minutes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(support)
    }

    /// Mark a session resolved. Idempotent: the resolution timestamp is set
    /// only the first time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the session doesn't exist.
    pub async fn resolve_support(&self, id: LabSupportId) -> Result<LabSupport, RepositoryError> {
        sqlx::query_as::<_, LabSupport>(&format!(
            "UPDATE lab_supports
             SET resolved_at = CASE WHEN is_resolved THEN resolved_at ELSE now() END,
                 is_resolved = TRUE
             WHERE id = $1
             RETURNING {SUPPORT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Aggregate lab-support activity for the statistics endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn statistics(&self) -> Result<SupportStatistics, RepositoryError> {
        let total_supports =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lab_supports")
                .fetch_one(self.pool)
                .await?;

        let resolved_supports = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lab_supports WHERE is_resolved",
        )
        .fetch_one(self.pool)
        .await?;

        let support_by_type = sqlx::query_as::<_, TypeCount>(
            "SELECT support_type, COUNT(*) AS count
             FROM lab_supports
             GROUP BY support_type
             ORDER BY support_type",
        )
        .fetch_all(self.pool)
        .await?;

        let support_by_lab = sqlx::query_as::<_, LabCount>(
            "SELECT l.title AS lab_title, COUNT(*) AS count
             FROM lab_supports s
             JOIN labs l ON l.id = s.lab_id
             GROUP BY l.title
             ORDER BY l.title",
        )
        .fetch_all(self.pool)
        .await?;

        let staff_performance = sqlx::query_as::<_, StaffPerformance>(
            "SELECT u.username AS staff_username,
                    COUNT(*) AS total_supports,
                    COUNT(*) FILTER (WHERE s.is_resolved) AS resolved_supports
             FROM lab_supports s
             JOIN users u ON u.id = s.staff_id
             GROUP BY u.username
             ORDER BY u.username",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(SupportStatistics {
            total_supports,
            resolved_supports,
            support_by_type,
            support_by_lab,
            staff_performance,
        })
    }

    // =========================================================================
    // Lab support limits
    // =========================================================================

    /// List all quota records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_limits(&self) -> Result<Vec<LabSupportLimit>, RepositoryError> {
        let limits = sqlx::query_as::<_, LabSupportLimit>(&format!(
            "SELECT {LIMIT_COLUMNS} FROM lab_support_limits ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(limits)
    }

    /// Get a quota record by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_limit(
        &self,
        id: LabSupportLimitId,
    ) -> Result<Option<LabSupportLimit>, RepositoryError> {
        let limit = sqlx::query_as::<_, LabSupportLimit>(&format!(
            "SELECT {LIMIT_COLUMNS} FROM lab_support_limits WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(limit)
    }

    /// Create a quota record for a lab.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the lab already has one.
    pub async fn create_limit(
        &self,
        lab_id: LabId,
        max_support_count: i32,
        support_duration_limit: i32,
    ) -> Result<LabSupportLimit, RepositoryError> {
        sqlx::query_as::<_, LabSupportLimit>(&format!(
            "INSERT INTO lab_support_limits (lab_id, max_support_count, support_duration_limit)
             VALUES ($1, $2, $3)
             RETURNING {LIMIT_COLUMNS}"
        ))
        .bind(lab_id)
        .bind(max_support_count)
        .bind(support_duration_limit)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("lab already has a support limit".to_owned());
            }
            RepositoryError::Database(e)
        })
    }

    /// Update a quota record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record doesn't exist.
    pub async fn update_limit(
        &self,
        id: LabSupportLimitId,
        max_support_count: i32,
        support_duration_limit: i32,
    ) -> Result<LabSupportLimit, RepositoryError> {
        sqlx::query_as::<_, LabSupportLimit>(&format!(
            "UPDATE lab_support_limits
             SET max_support_count = $2, support_duration_limit = $3
             WHERE id = $1
             RETURNING {LIMIT_COLUMNS}"
        ))
        .bind(id)
        .bind(max_support_count)
        .bind(support_duration_limit)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a quota record. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_limit(&self, id: LabSupportLimitId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM lab_support_limits WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
