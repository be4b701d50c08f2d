use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::toil::ToilScenario;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "leave_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Toil,
    Sick,
}

impl LeaveType {
    pub const ALL: [LeaveType; 3] = [LeaveType::Annual, LeaveType::Toil, LeaveType::Sick];

    /// TOIL is tracked in hours; annual and sick leave in days.
    pub fn is_hour_denominated(self) -> bool {
        matches!(self, LeaveType::Toil)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Leave request with requester name populated from join. TOIL accrual rows
/// additionally carry the scenario columns; spend rows leave them null.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub leave_type: LeaveType,
    pub start_date: time::Date,
    pub end_date: time::Date,
    pub hours: Option<f64>,
    pub reason: Option<String>,
    pub scenario: Option<ToilScenario>,
    pub covering_user_id: Option<Uuid>,
    pub return_time: Option<time::Time>,
    pub status: LeaveStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewer_notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Spend request (annual / sick days, or TOIL hours already banked).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeaveRequest {
    pub leave_type: LeaveType,
    pub start_date: time::Date,
    pub end_date: time::Date,
    #[validate(range(min = 0.5, max = 24.0, message = "hours must be between 0.5 and 24"))]
    pub hours: Option<f64>,
    #[validate(length(max = 500, message = "reason is limited to 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewLeaveRequest {
    pub status: LeaveStatus,
    pub reviewer_notes: Option<String>,
}

/// Per-user, per-type balance. `remaining` is derived in SQL as
/// `total - used`, never stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub user_id: Uuid,
    pub leave_type: LeaveType,
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

/// Amount a spend request draws from its balance: hours for TOIL, inclusive
/// calendar days otherwise.
pub fn spend_amount(req: &CreateLeaveRequest) -> Option<f64> {
    if req.leave_type.is_hour_denominated() {
        req.hours
    } else {
        let days = (req.end_date - req.start_date).whole_days() + 1;
        Some(days as f64)
    }
}
