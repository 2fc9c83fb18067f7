//! Support domain types: tickets, threaded messages, lab-support sessions,
//! and per-lab support quotas.

use chrono::{DateTime, Utc};
use serde::Serialize;

use brightkit_core::{
    LabId, LabSupportId, LabSupportLimitId, MessageId, SupportType, TicketId, TicketStatus, UserId,
};

use super::catalog::LabSummary;
use super::user::UserPublic;

/// A support ticket row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupportTicket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub user_id: UserId,
    pub lab_id: LabId,
    pub staff_id: Option<UserId>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing ticket with its lab, owner, and message thread.
#[derive(Debug, Serialize)]
pub struct SupportTicketResponse {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub user: UserPublic,
    pub lab: LabSummary,
    pub staff: Option<UserPublic>,
    pub status: TicketStatus,
    pub messages: Vec<SupportMessageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One message in a ticket's append-only thread.
#[derive(Debug, Serialize)]
pub struct SupportMessageResponse {
    pub id: MessageId,
    pub message: String,
    pub sender: UserPublic,
    pub created_at: DateTime<Utc>,
}

/// A logged lab-support session row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabSupport {
    pub id: LabSupportId,
    pub lab_id: LabId,
    pub customer_id: UserId,
    pub staff_id: Option<UserId>,
    pub support_type: SupportType,
    pub description: String,
    pub solution: String,
    pub duration_minutes: i32,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Client-facing lab-support session.
#[derive(Debug, Serialize)]
pub struct LabSupportResponse {
    pub id: LabSupportId,
    pub lab: LabSummary,
    pub customer: UserPublic,
    pub staff: Option<UserPublic>,
    pub support_type: SupportType,
    pub description: String,
    pub solution: String,
    pub duration_minutes: i32,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Per-lab support quota row. One-to-one with a lab; absence means no cap.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LabSupportLimit {
    pub id: LabSupportLimitId,
    pub lab_id: LabId,
    pub max_support_count: i32,
    pub support_duration_limit: i32,
}

/// Limit response with the lab embedded.
#[derive(Debug, Serialize)]
pub struct LabSupportLimitResponse {
    pub id: LabSupportLimitId,
    pub lab: LabSummary,
    pub max_support_count: i32,
    pub support_duration_limit: i32,
}

/// Aggregate view of lab-support activity, for the statistics endpoint.
#[derive(Debug, Serialize)]
pub struct SupportStatistics {
    pub total_supports: i64,
    pub resolved_supports: i64,
    pub support_by_type: Vec<TypeCount>,
    pub support_by_lab: Vec<LabCount>,
    pub staff_performance: Vec<StaffPerformance>,
}

/// Session count per support type.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TypeCount {
    pub support_type: SupportType,
    pub count: i64,
}

/// Session count per lab.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LabCount {
    pub lab_title: String,
    pub count: i64,
}

/// Per-staff totals and resolution counts.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StaffPerformance {
    pub staff_username: String,
    pub total_supports: i64,
    pub resolved_supports: i64,
}

/// Whether a customer has exhausted the support quota for a lab.
///
/// `used` is the number of existing sessions for the (lab, customer) pair;
/// creation is rejected once it reaches the cap.
#[must_use]
pub fn quota_reached(max_support_count: i32, used: i64) -> bool {
    used >= i64::from(max_support_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_reached_at_cap() {
        assert!(!quota_reached(3, 0));
        assert!(!quota_reached(3, 2));
        assert!(quota_reached(3, 3));
        assert!(quota_reached(3, 4));
    }

    #[test]
    fn test_quota_zero_cap_blocks_all() {
        assert!(quota_reached(0, 0));
    }
}
