use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
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
        leave::{LeaveBalance, LeaveType},
        user::{CreateUserRequest, UpdateUserRequest, UserProfile},
    },
    AppState,
};

/// Active colleagues, visible to any authenticated user so the TOIL form can
/// offer coverage candidates.
pub async fn list(
    State(pool): State<PgPool>,
    _auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<UserProfile>>> {
    let users = sqlx::query_as::<_, UserProfile>(
        "SELECT id, first_name, last_name, email, role, is_active \
         FROM users WHERE is_active = true \
         ORDER BY last_name, first_name \
         LIMIT $1 OFFSET $2",
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserProfile>> {
    if !auth.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    body.validate()?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string();

    let id = Uuid::new_v4();
    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, role, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, true)",
    )
    .bind(id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.email)
    .bind(&password_hash)
    .bind(body.role)
    .execute(&mut *tx)
    .await?;

    // Seed one balance row per leave type. TOIL starts empty and is earned
    // through approved accruals.
    let policy = state.leave_policy;
    for leave_type in LeaveType::ALL {
        let total = match leave_type {
            LeaveType::Annual => policy.annual_allowance_days,
            LeaveType::Sick => policy.sick_allowance_days,
            LeaveType::Toil => 0.0,
        };
        sqlx::query(
            "INSERT INTO leave_balances (user_id, leave_type, total, used) VALUES ($1, $2, $3, 0)",
        )
        .bind(id)
        .bind(leave_type)
        .bind(total)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, first_name, last_name, email, role, is_active FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(profile))
}

pub async fn get_one(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>> {
    if !auth.role.is_admin() && auth.id != id {
        return Err(AppError::Forbidden);
    }

    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, first_name, last_name, email, role, is_active FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(profile))
}

pub async fn update(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>> {
    if !auth.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    body.validate()?;

    let profile = sqlx::query_as::<_, UserProfile>(
        "UPDATE users SET \
            first_name = COALESCE($2, first_name), \
            last_name  = COALESCE($3, last_name), \
            email      = COALESCE($4, email), \
            role       = COALESCE($5, role), \
            is_active  = COALESCE($6, is_active), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, first_name, last_name, email, role, is_active",
    )
    .bind(id)
    .bind(body.first_name)
    .bind(body.last_name)
    .bind(body.email)
    .bind(body.role)
    .bind(body.is_active)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(profile))
}

pub async fn deactivate(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if !auth.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    if auth.id == id {
        return Err(AppError::BadRequest("You cannot deactivate yourself".into()));
    }

    let rows_affected = sqlx::query("UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn balances(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeaveBalance>>> {
    if !auth.role.is_admin() && auth.id != id {
        return Err(AppError::Forbidden);
    }

    let balances = sqlx::query_as::<_, LeaveBalance>(
        "SELECT user_id, leave_type, total, used, total - used AS remaining \
         FROM leave_balances WHERE user_id = $1 ORDER BY leave_type",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(balances))
}
