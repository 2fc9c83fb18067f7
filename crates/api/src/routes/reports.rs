//! Reporting routes for staff dashboards.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::db::{DeliveryReportRow, ReportsRepository, SalesReportRow, SupportReportRow};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Optional date range for the sales report.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn require_staff(user: &CurrentUser) -> Result<()> {
    if user.role.is_staff_or_above() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("invalid date: {raw}, expected YYYY-MM-DD")))
}

/// Resolve the query range. Both bounds must be given together; otherwise
/// the range defaults to the last 30 days ending today.
fn resolve_range(query: &DateRangeQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    match (&query.start_date, &query.end_date) {
        (Some(start), Some(end)) => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            if start > end {
                return Err(AppError::BadRequest(
                    "start_date must not be after end_date".to_string(),
                ));
            }
            Ok((start, end))
        }
        _ => Ok((today - Duration::days(DEFAULT_WINDOW_DAYS), today)),
    }
}

fn last_30_days(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(DEFAULT_WINDOW_DAYS), today)
}

/// Per-day sales over a range, defaulting to the last 30 days.
///
/// GET /api/reports/sales?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
///
/// # Errors
///
/// Returns 403 unless the caller is staff or above; 400 for a malformed
/// or inverted range.
pub async fn sales(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<SalesReportRow>>> {
    require_staff(&user)?;

    let (start, end) = resolve_range(&query, Utc::now().date_naive())?;

    let repo = ReportsRepository::new(state.pool());
    let rows = repo.sales_by_day(start, end).await?;

    Ok(Json(rows))
}

/// Per-day ticket counts over the last 30 days.
///
/// GET /api/reports/support
///
/// # Errors
///
/// Returns 403 unless the caller is staff or above.
pub async fn support(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SupportReportRow>>> {
    require_staff(&user)?;

    let (start, end) = last_30_days(Utc::now().date_naive());

    let repo = ReportsRepository::new(state.pool());
    let rows = repo.support_by_day(start, end).await?;

    Ok(Json(rows))
}

/// Order counts per pipeline status.
///
/// GET /api/reports/delivery
///
/// # Errors
///
/// Returns 403 unless the caller is staff or above.
pub async fn delivery(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<DeliveryReportRow>>> {
    require_staff(&user)?;

    let repo = ReportsRepository::new(state.pool());
    let rows = repo.orders_by_status().await?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).expect("test date")
    }

    #[test]
    fn test_explicit_range() {
        let query = DateRangeQuery {
            start_date: Some("2026-01-01".to_string()),
            end_date: Some("2026-01-31".to_string()),
        };
        let (start, end) = resolve_range(&query, date("2026-08-01")).expect("range");
        assert_eq!(start, date("2026-01-01"));
        assert_eq!(end, date("2026-01-31"));
    }

    #[test]
    fn test_missing_bound_falls_back_to_default_window() {
        let today = date("2026-08-01");
        let query = DateRangeQuery {
            start_date: Some("2026-01-01".to_string()),
            end_date: None,
        };
        let (start, end) = resolve_range(&query, today).expect("range");
        assert_eq!(end, today);
        assert_eq!(start, today - Duration::days(DEFAULT_WINDOW_DAYS));
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let query = DateRangeQuery {
            start_date: Some("01/01/2026".to_string()),
            end_date: Some("2026-01-31".to_string()),
        };
        assert!(resolve_range(&query, date("2026-08-01")).is_err());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let query = DateRangeQuery {
            start_date: Some("2026-02-01".to_string()),
            end_date: Some("2026-01-01".to_string()),
        };
        assert!(resolve_range(&query, date("2026-08-01")).is_err());
    }
}
