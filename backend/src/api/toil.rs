use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::leave::{LeaveRequest, LeaveType},
    toil::{self, ToilScenario},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct ScenarioEntry {
    pub scenario: ToilScenario,
    pub label: &'static str,
    pub description: &'static str,
    pub help_text: &'static str,
}

/// Scenario metadata for the submission form: one entry per scenario, in
/// display order.
pub async fn scenarios() -> Json<Vec<ScenarioEntry>> {
    let entries = ToilScenario::ALL
        .into_iter()
        .map(|scenario| {
            let info = scenario.info();
            ScenarioEntry {
                scenario,
                label: info.label,
                description: info.description,
                help_text: info.help_text,
            }
        })
        .collect();
    Json(entries)
}

/// Accept a raw TOIL submission, run it through the scenario validator, and
/// record the accrual as a pending leave request carrying the credit it will
/// earn on approval.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(raw): Json<serde_json::Value>,
) -> Result<Json<LeaveRequest>> {
    let submission = toil::validate(&raw).map_err(AppError::ToilValidation)?;

    if let Some(return_date) = submission.return_date() {
        if return_date < submission.travel_date() {
            return Err(AppError::BadRequest(
                "return_date must be >= travel_date".into(),
            ));
        }
    }

    // The validator only guarantees a non-empty identifier; referential rules
    // live here where the user table is reachable.
    let covering_user_id = match submission.covering_user_id() {
        Some(raw_id) => {
            let covering_id: Uuid = raw_id
                .parse()
                .map_err(|_| AppError::BadRequest("covering_user_id must be a user id".into()))?;
            if covering_id == auth.id {
                return Err(AppError::BadRequest(
                    "You cannot name yourself as coverage".into(),
                ));
            }
            let is_active: Option<bool> =
                sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
                    .bind(covering_id)
                    .fetch_optional(&state.pool)
                    .await?;
            match is_active {
                Some(true) => Some(covering_id),
                _ => {
                    return Err(AppError::BadRequest(
                        "Covering user does not exist or is inactive".into(),
                    ))
                }
            }
        }
        None => None,
    };

    let credit = toil::credit_hours(&submission, &state.leave_policy.toil);

    let id = Uuid::new_v4();
    let start_date = submission.travel_date();
    let end_date = submission.return_date().unwrap_or(start_date);

    sqlx::query(
        "INSERT INTO leave_requests \
            (id, user_id, leave_type, start_date, end_date, hours, reason, \
             scenario, covering_user_id, return_time, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')",
    )
    .bind(id)
    .bind(auth.id)
    .bind(LeaveType::Toil)
    .bind(start_date)
    .bind(end_date)
    .bind(credit)
    .bind(submission.reason())
    .bind(submission.scenario())
    .bind(covering_user_id)
    .bind(submission.return_time())
    .execute(&state.pool)
    .await?;

    let request = super::leave::fetch_request(&state.pool, id).await?;
    Ok(Json(request))
}
