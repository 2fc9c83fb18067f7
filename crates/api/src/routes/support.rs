//! Support routes: tickets with threaded messages, lab-support sessions
//! with quota enforcement, and the per-lab quota records themselves.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use sqlx::PgPool;

use brightkit_core::{
    LabId, LabSupportId, LabSupportLimitId, Role, SupportType, TicketId, TicketStatus, UserId,
};

use crate::db::{CatalogRepository, SupportRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{
    CurrentUser, LabSummary, LabSupport, LabSupportLimit, LabSupportLimitResponse,
    LabSupportResponse, SupportMessageResponse, SupportStatistics, SupportTicket,
    SupportTicketResponse, UserPublic,
};
use crate::state::AppState;

/// Request body for opening a ticket.
#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub lab_id: LabId,
}

/// Request body for appending a message to a ticket.
#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub message: String,
}

/// Request body for a ticket status update. `status` is optional so a
/// missing field produces the designed 400.
#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: Option<String>,
}

/// Request body for logging a lab-support session.
#[derive(Debug, Deserialize)]
pub struct CreateSupportRequest {
    pub lab_id: LabId,
    pub support_type: SupportType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub duration_minutes: i32,
}

/// Request body for creating a quota record.
#[derive(Debug, Deserialize)]
pub struct LimitRequest {
    pub lab_id: LabId,
    pub max_support_count: i32,
    pub support_duration_limit: i32,
}

/// Request body for updating a quota record. The lab binding is fixed at
/// creation; only the caps can change.
#[derive(Debug, Deserialize)]
pub struct UpdateLimitRequest {
    pub max_support_count: i32,
    pub support_duration_limit: i32,
}

fn require_staff(user: &CurrentUser) -> Result<()> {
    if user.role.is_staff_or_above() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn require_support_staff(user: &CurrentUser) -> Result<()> {
    if user.role.is_support_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

async fn lab_summary(pool: &PgPool, lab_id: LabId) -> Result<LabSummary> {
    let catalog = CatalogRepository::new(pool);
    let lab = catalog
        .get_lab(lab_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lab {lab_id}")))?;

    Ok(LabSummary::from(&lab))
}

async fn optional_user(pool: &PgPool, id: Option<UserId>) -> Result<Option<UserPublic>> {
    let Some(id) = id else { return Ok(None) };
    let users = UserRepository::new(pool);

    Ok(Some(users.public_by_id(id).await?))
}

/// Assemble the client-facing ticket shape with its message thread.
async fn ticket_response(pool: &PgPool, ticket: SupportTicket) -> Result<SupportTicketResponse> {
    let users = UserRepository::new(pool);
    let support = SupportRepository::new(pool);

    let user = users.public_by_id(ticket.user_id).await?;
    let lab = lab_summary(pool, ticket.lab_id).await?;
    let staff = optional_user(pool, ticket.staff_id).await?;
    let messages: Vec<SupportMessageResponse> = support.messages_for_ticket(ticket.id).await?;

    Ok(SupportTicketResponse {
        id: ticket.id,
        title: ticket.title,
        description: ticket.description,
        user,
        lab,
        staff,
        status: ticket.status,
        messages,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
    })
}

/// Assemble the client-facing lab-support session shape.
async fn support_response(pool: &PgPool, support: LabSupport) -> Result<LabSupportResponse> {
    let users = UserRepository::new(pool);

    let lab = lab_summary(pool, support.lab_id).await?;
    let customer = users.public_by_id(support.customer_id).await?;
    let staff = optional_user(pool, support.staff_id).await?;

    Ok(LabSupportResponse {
        id: support.id,
        lab,
        customer,
        staff,
        support_type: support.support_type,
        description: support.description,
        solution: support.solution,
        duration_minutes: support.duration_minutes,
        is_resolved: support.is_resolved,
        resolved_at: support.resolved_at,
        created_at: support.created_at,
    })
}

// =============================================================================
// Tickets
// =============================================================================

/// List tickets. Admin and staff see the whole queue; everyone else sees
/// their own tickets, managers included.
///
/// GET /api/support/tickets
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_tickets(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SupportTicketResponse>>> {
    let repo = SupportRepository::new(state.pool());

    let tickets = if matches!(user.role, Role::Admin | Role::Staff) {
        repo.list_tickets_all().await?
    } else {
        repo.list_tickets_for_user(user.id).await?
    };

    let mut responses = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        responses.push(ticket_response(state.pool(), ticket).await?);
    }

    Ok(Json(responses))
}

/// Get one ticket with its message thread.
///
/// GET /api/support/tickets/{id}
///
/// # Errors
///
/// Returns 404 if missing, 403 if the caller is neither owner nor staff.
pub async fn show_ticket(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
) -> Result<Json<SupportTicketResponse>> {
    let repo = SupportRepository::new(state.pool());

    let ticket = repo
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))?;

    if ticket.user_id != user.id && !user.role.is_staff_or_above() {
        return Err(AppError::Forbidden);
    }

    Ok(Json(ticket_response(state.pool(), ticket).await?))
}

/// Open a ticket against a lab.
///
/// POST /api/support/tickets
///
/// # Errors
///
/// Returns 400 for an empty title or unknown lab.
pub async fn create_ticket(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicketResponse>)> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let catalog = CatalogRepository::new(state.pool());
    if catalog.get_lab(req.lab_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "lab {} does not exist",
            req.lab_id
        )));
    }

    let repo = SupportRepository::new(state.pool());
    let ticket = repo
        .create_ticket(&req.title, &req.description, user.id, req.lab_id)
        .await?;

    tracing::info!(ticket_id = %ticket.id, "support ticket opened");

    Ok((
        StatusCode::CREATED,
        Json(ticket_response(state.pool(), ticket).await?),
    ))
}

/// Append a message to a ticket's thread.
///
/// POST /api/support/tickets/{id}/messages
///
/// # Errors
///
/// Returns 404 if the ticket is missing, 403 if the caller is neither
/// owner nor staff, 400 for an empty message.
pub async fn add_message(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
    Json(req): Json<AddMessageRequest>,
) -> Result<(StatusCode, Json<SupportTicketResponse>)> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }

    let repo = SupportRepository::new(state.pool());
    let ticket = repo
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ticket {id}")))?;

    if ticket.user_id != user.id && !user.role.is_staff_or_above() {
        return Err(AppError::Forbidden);
    }

    repo.add_message(id, user.id, &req.message).await?;

    Ok((
        StatusCode::CREATED,
        Json(ticket_response(state.pool(), ticket).await?),
    ))
}

/// Self-assign a ticket and move it to `in_progress`.
///
/// POST /api/support/tickets/{id}/assign
///
/// # Errors
///
/// Returns 403 unless the caller is staff or above; 404 if missing.
pub async fn assign_staff(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
) -> Result<Json<SupportTicketResponse>> {
    require_staff(&user)?;

    let repo = SupportRepository::new(state.pool());
    let ticket = repo.assign_staff(id, user.id).await?;

    Ok(Json(ticket_response(state.pool(), ticket).await?))
}

/// Update a ticket's status.
///
/// POST /api/support/tickets/{id}/status
///
/// # Errors
///
/// Returns 400 for a missing or unknown status value, 403 unless the
/// caller is staff or above, 404 if the ticket is missing.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<TicketId>,
    Json(req): Json<TicketStatusRequest>,
) -> Result<Json<SupportTicketResponse>> {
    let Some(raw) = req.status else {
        return Err(AppError::BadRequest("Status is required".to_string()));
    };

    let status: TicketStatus = raw
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".to_string()))?;

    require_staff(&user)?;

    let repo = SupportRepository::new(state.pool());
    let ticket = repo.set_ticket_status(id, status).await?;

    Ok(Json(ticket_response(state.pool(), ticket).await?))
}

// =============================================================================
// Lab support sessions
// =============================================================================

/// List lab-support sessions. Admin and staff see everything; everyone
/// else sees the sessions where they are the customer.
///
/// GET /api/support/lab-support
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_supports(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<LabSupportResponse>>> {
    let repo = SupportRepository::new(state.pool());

    let supports = if matches!(user.role, Role::Admin | Role::Staff) {
        repo.list_supports_all().await?
    } else {
        repo.list_supports_for_customer(user.id).await?
    };

    let mut responses = Vec::with_capacity(supports.len());
    for support in supports {
        responses.push(support_response(state.pool(), support).await?);
    }

    Ok(Json(responses))
}

/// Get one lab-support session.
///
/// GET /api/support/lab-support/{id}
///
/// # Errors
///
/// Returns 404 if missing, 403 if the caller is neither the customer nor
/// staff.
pub async fn show_support(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabSupportId>,
) -> Result<Json<LabSupportResponse>> {
    let repo = SupportRepository::new(state.pool());

    let support = repo
        .get_support(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lab support {id}")))?;

    if support.customer_id != user.id && !user.role.is_staff_or_above() {
        return Err(AppError::Forbidden);
    }

    Ok(Json(support_response(state.pool(), support).await?))
}

/// Log a lab-support session. A staff caller is recorded as the handling
/// staff member; a customer's session starts unassigned. Rejected with 400
/// once the customer has used up the lab's quota.
///
/// POST /api/support/lab-support
///
/// # Errors
///
/// Returns 400 for an unknown lab or an exhausted quota.
pub async fn create_support(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateSupportRequest>,
) -> Result<(StatusCode, Json<LabSupportResponse>)> {
    if req.duration_minutes < 0 {
        return Err(AppError::BadRequest("duration must not be negative".to_string()));
    }

    let catalog = CatalogRepository::new(state.pool());
    if catalog.get_lab(req.lab_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "lab {} does not exist",
            req.lab_id
        )));
    }

    let staff_id = user.role.is_support_staff().then_some(user.id);

    let repo = SupportRepository::new(state.pool());
    let support = repo
        .create_support(
            req.lab_id,
            user.id,
            staff_id,
            req.support_type,
            &req.description,
            &req.solution,
            req.duration_minutes,
        )
        .await?;

    tracing::info!(support_id = %support.id, lab_id = %req.lab_id, "lab support logged");

    Ok((
        StatusCode::CREATED,
        Json(support_response(state.pool(), support).await?),
    ))
}

/// Mark a session resolved. Calling it again leaves the original
/// resolution timestamp in place.
///
/// POST /api/support/lab-support/{id}/resolve
///
/// # Errors
///
/// Returns 404 if missing, 403 if the caller is neither the customer nor
/// support staff.
pub async fn resolve_support(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabSupportId>,
) -> Result<Json<LabSupportResponse>> {
    let repo = SupportRepository::new(state.pool());

    let support = repo
        .get_support(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lab support {id}")))?;

    if support.customer_id != user.id && !user.role.is_support_staff() {
        return Err(AppError::Forbidden);
    }

    let support = repo.resolve_support(id).await?;

    Ok(Json(support_response(state.pool(), support).await?))
}

/// Aggregate lab-support activity.
///
/// GET /api/support/lab-support/statistics
///
/// # Errors
///
/// Returns 403 unless the caller is staff or above.
pub async fn statistics(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<SupportStatistics>> {
    require_staff(&user)?;

    let repo = SupportRepository::new(state.pool());
    let stats = repo.statistics().await?;

    Ok(Json(stats))
}

// =============================================================================
// Lab support limits
// =============================================================================

async fn limit_response(pool: &PgPool, limit: LabSupportLimit) -> Result<LabSupportLimitResponse> {
    let lab = lab_summary(pool, limit.lab_id).await?;

    Ok(LabSupportLimitResponse {
        id: limit.id,
        lab,
        max_support_count: limit.max_support_count,
        support_duration_limit: limit.support_duration_limit,
    })
}

/// List quota records. Readable by any authenticated user; only writes
/// are restricted.
///
/// GET /api/support/lab-support-limits
///
/// # Errors
///
/// Returns 500 on database failure.
pub async fn list_limits(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<LabSupportLimitResponse>>> {
    let repo = SupportRepository::new(state.pool());
    let limits = repo.list_limits().await?;

    let mut responses = Vec::with_capacity(limits.len());
    for limit in limits {
        responses.push(limit_response(state.pool(), limit).await?);
    }

    Ok(Json(responses))
}

/// Get one quota record.
///
/// GET /api/support/lab-support-limits/{id}
///
/// # Errors
///
/// Returns 404 if missing.
pub async fn show_limit(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<LabSupportLimitId>,
) -> Result<Json<LabSupportLimitResponse>> {
    let repo = SupportRepository::new(state.pool());
    let limit = repo
        .get_limit(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("support limit {id}")))?;

    Ok(Json(limit_response(state.pool(), limit).await?))
}

/// Create a quota record for a lab.
///
/// POST /api/support/lab-support-limits
///
/// # Errors
///
/// Returns 403 unless the caller is admin or staff; 400 for an unknown
/// lab, a negative cap, or a lab that already has a record.
pub async fn create_limit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<LimitRequest>,
) -> Result<(StatusCode, Json<LabSupportLimitResponse>)> {
    require_support_staff(&user)?;
    validate_limit_values(req.max_support_count, req.support_duration_limit)?;

    let catalog = CatalogRepository::new(state.pool());
    if catalog.get_lab(req.lab_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "lab {} does not exist",
            req.lab_id
        )));
    }

    let repo = SupportRepository::new(state.pool());
    let limit = repo
        .create_limit(req.lab_id, req.max_support_count, req.support_duration_limit)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(limit_response(state.pool(), limit).await?),
    ))
}

/// Update a quota record.
///
/// PUT /api/support/lab-support-limits/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or staff; 404 if missing.
pub async fn update_limit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabSupportLimitId>,
    Json(req): Json<UpdateLimitRequest>,
) -> Result<Json<LabSupportLimitResponse>> {
    require_support_staff(&user)?;
    validate_limit_values(req.max_support_count, req.support_duration_limit)?;

    let repo = SupportRepository::new(state.pool());
    let limit = repo
        .update_limit(id, req.max_support_count, req.support_duration_limit)
        .await?;

    Ok(Json(limit_response(state.pool(), limit).await?))
}

/// Delete a quota record.
///
/// DELETE /api/support/lab-support-limits/{id}
///
/// # Errors
///
/// Returns 403 unless the caller is admin or staff; 404 if missing.
pub async fn delete_limit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<LabSupportLimitId>,
) -> Result<StatusCode> {
    require_support_staff(&user)?;

    let repo = SupportRepository::new(state.pool());
    if !repo.delete_limit(id).await? {
        return Err(AppError::NotFound(format!("support limit {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_limit_values(max_support_count: i32, support_duration_limit: i32) -> Result<()> {
    if max_support_count < 0 {
        return Err(AppError::BadRequest(
            "max_support_count must not be negative".to_string(),
        ));
    }
    if support_duration_limit < 0 {
        return Err(AppError::BadRequest(
            "support_duration_limit must not be negative".to_string(),
        ));
    }
    Ok(())
}
