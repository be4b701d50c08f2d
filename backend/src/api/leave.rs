use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::{
        common::PaginationParams,
        leave::{
            spend_amount, CreateLeaveRequest, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
            ReviewLeaveRequest,
        },
    },
};

const LEAVE_SELECT: &str = "SELECT lr.id, lr.user_id, u.first_name, u.last_name, \
    lr.leave_type, lr.start_date, lr.end_date, lr.hours, lr.reason, \
    lr.scenario, lr.covering_user_id, lr.return_time, \
    lr.status, lr.reviewed_by, lr.reviewer_notes, lr.created_at, lr.updated_at \
    FROM leave_requests lr JOIN users u ON u.id = lr.user_id";

pub(crate) async fn fetch_request(pool: &PgPool, id: Uuid) -> Result<LeaveRequest> {
    let query = format!("{LEAVE_SELECT} WHERE lr.id = $1");
    sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Leave request {} not found", id)))
}

pub async fn list(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<LeaveRequest>>> {
    // Single query with conditional filter: admins see everything, employees
    // only their own requests.
    let is_admin = auth.role.can_review_leave();
    let query = format!(
        "{LEAVE_SELECT} WHERE ($1 OR lr.user_id = $2) \
         ORDER BY lr.created_at DESC LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(is_admin)
        .bind(auth.id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    Ok(Json(rows))
}

pub async fn get_one(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>> {
    let request = fetch_request(&pool, id).await?;

    if !auth.role.can_review_leave() && request.user_id != auth.id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(request))
}

pub async fn create(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Json(body): Json<CreateLeaveRequest>,
) -> Result<Json<LeaveRequest>> {
    body.validate()?;

    if body.end_date < body.start_date {
        return Err(AppError::BadRequest("end_date must be >= start_date".into()));
    }

    let amount = spend_amount(&body).ok_or_else(|| {
        AppError::BadRequest("TOIL leave must specify how many hours to spend".into())
    })?;

    // Advisory check against the current balance; the authoritative deduction
    // happens at approval time inside a transaction.
    let remaining: Option<f64> = sqlx::query_scalar(
        "SELECT total - used FROM leave_balances WHERE user_id = $1 AND leave_type = $2",
    )
    .bind(auth.id)
    .bind(body.leave_type)
    .fetch_optional(&pool)
    .await?;
    let remaining = remaining
        .ok_or_else(|| AppError::NotFound("No balance record for this leave type".into()))?;

    if amount > remaining {
        return Err(AppError::BadRequest(format!(
            "Insufficient balance: requested {} but only {} remaining",
            amount, remaining
        )));
    }

    let id = Uuid::new_v4();
    let hours = if body.leave_type.is_hour_denominated() {
        body.hours
    } else {
        None
    };

    sqlx::query(
        "INSERT INTO leave_requests (id, user_id, leave_type, start_date, end_date, hours, reason, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')",
    )
    .bind(id)
    .bind(auth.id)
    .bind(body.leave_type)
    .bind(body.start_date)
    .bind(body.end_date)
    .bind(hours)
    .bind(&body.reason)
    .execute(&pool)
    .await?;

    let request = fetch_request(&pool, id).await?;
    Ok(Json(request))
}

pub async fn cancel(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let owner: Option<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM leave_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    let owner = owner.ok_or_else(|| AppError::NotFound(format!("Leave request {} not found", id)))?;

    if owner != auth.id && !auth.role.is_admin() {
        return Err(AppError::Forbidden);
    }

    let rows_affected = sqlx::query(
        "UPDATE leave_requests SET status = 'cancelled', updated_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(&pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::Conflict("Only pending requests can be cancelled".into()));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Internal row type for the review transaction.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    user_id: Uuid,
    leave_type: LeaveType,
    start_date: time::Date,
    end_date: time::Date,
    hours: Option<f64>,
    is_accrual: bool,
}

pub async fn review(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewLeaveRequest>,
) -> Result<Json<LeaveRequest>> {
    if !auth.role.can_review_leave() {
        return Err(AppError::Forbidden);
    }

    if !matches!(body.status, LeaveStatus::Approved | LeaveStatus::Rejected) {
        return Err(AppError::BadRequest(
            "status must be 'approved' or 'rejected'".into(),
        ));
    }

    // Status transition and balance bookkeeping commit atomically.
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT user_id, leave_type, start_date, end_date, hours, \
                scenario IS NOT NULL AS is_accrual \
         FROM leave_requests WHERE id = $1 AND status = 'pending' FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Leave request not found or already reviewed".into()))?;

    if row.user_id == auth.id {
        return Err(AppError::Forbidden);
    }

    if body.status == LeaveStatus::Approved {
        if row.is_accrual {
            // TOIL accrual: the earned hours raise the TOIL allowance.
            let credit = row.hours.unwrap_or(0.0);
            sqlx::query(
                "UPDATE leave_balances SET total = total + $3 \
                 WHERE user_id = $1 AND leave_type = $2",
            )
            .bind(row.user_id)
            .bind(LeaveType::Toil)
            .bind(credit)
            .execute(&mut *tx)
            .await?;
        } else {
            let amount = if row.leave_type.is_hour_denominated() {
                row.hours.ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("TOIL spend request {} has no hours", id))
                })?
            } else {
                ((row.end_date - row.start_date).whole_days() + 1) as f64
            };
            let rows_affected = sqlx::query(
                "UPDATE leave_balances SET used = used + $3 \
                 WHERE user_id = $1 AND leave_type = $2 AND total - used >= $3",
            )
            .bind(row.user_id)
            .bind(row.leave_type)
            .bind(amount)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                return Err(AppError::Conflict(
                    "Balance no longer covers this request".into(),
                ));
            }
        }
    }

    sqlx::query(
        "UPDATE leave_requests \
         SET status = $2, reviewed_by = $3, reviewer_notes = $4, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(body.status)
    .bind(auth.id)
    .bind(&body.reviewer_notes)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let request = fetch_request(&pool, id).await?;
    Ok(Json(request))
}

pub async fn my_balances(
    State(pool): State<PgPool>,
    auth: AuthUser,
) -> Result<Json<Vec<LeaveBalance>>> {
    let balances = sqlx::query_as::<_, LeaveBalance>(
        "SELECT user_id, leave_type, total, used, total - used AS remaining \
         FROM leave_balances WHERE user_id = $1 ORDER BY leave_type",
    )
    .bind(auth.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(balances))
}
