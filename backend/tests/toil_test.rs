mod common;

use std::net::SocketAddr;

use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{}+{}@test.local", prefix, &Uuid::new_v4().to_string()[..8])
}

async fn submit_toil(
    addr: SocketAddr,
    token: &str,
    payload: serde_json::Value,
) -> reqwest::Response {
    common::http_client()
        .post(format!("http://{}/api/toil", addr))
        .header("Authorization", format!("Bearer {}", token))
        .json(&payload)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn scenario_metadata_lists_all_four_scenarios() {
    let (addr, _pool) = common::setup_test_app().await;

    let resp = common::http_client()
        .get(format!("http://{}/api/toil/scenarios", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 4);

    let scenarios: Vec<&str> = entries
        .iter()
        .map(|e| e["scenario"].as_str().unwrap())
        .collect();
    assert_eq!(
        scenarios,
        vec![
            "local_show",
            "working_day_panel",
            "overnight_day_off",
            "overnight_working_day"
        ]
    );
    for entry in entries {
        assert!(!entry["label"].as_str().unwrap().is_empty());
        assert!(!entry["description"].as_str().unwrap().is_empty());
        assert!(!entry["help_text"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn overnight_working_day_submission_creates_pending_accrual() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-submit");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "overnight_working_day",
            "travel_date": "2025-03-01",
            "reason": "Returning from trade show",
            "return_date": "2025-03-02",
            "return_time": "06:30",
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["leave_type"], "toil");
    assert_eq!(body["scenario"], "overnight_working_day");
    assert_eq!(body["start_date"], "2025-03-01");
    assert_eq!(body["end_date"], "2025-03-02");
    // 6h30 of the working day spent travelling.
    assert_eq!(body["hours"].as_f64().unwrap(), 6.5);

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn day_off_return_carries_the_fixed_credit() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-dayoff");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "overnight_day_off",
            "travel_date": "2025-03-01",
            "reason": "Overnight for regional show",
            "return_date": "2025-03-02",
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["hours"].as_f64().unwrap(), 4.0);

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn invalid_submission_returns_field_level_details() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-invalid");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "working_day_panel",
            "travel_date": "2025-03-01",
            "reason": "short",
        }),
    )
    .await;
    assert_eq!(resp.status(), 422);

    let body: serde_json::Value = resp.json().await.unwrap();
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    let codes: Vec<&str> = details.iter().map(|d| d["code"].as_str().unwrap()).collect();
    assert!(codes.contains(&"reason_too_short"));
    assert!(codes.contains(&"coverage_required"));

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn unknown_scenario_returns_422() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-unknown");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "FOO",
            "travel_date": "2025-03-01",
            "reason": "A perfectly long reason",
        }),
    )
    .await;
    assert_eq!(resp.status(), 422);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["details"][0]["code"], "unknown_scenario");

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn return_before_travel_date_is_rejected_with_400() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-reversed");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    // Structurally valid per scenario rules, but the dates are reversed;
    // this must come back as user error, not a constraint blow-up.
    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "overnight_day_off",
            "travel_date": "2024-12-01",
            "reason": "Overnight for regional show",
            "return_date": "2024-11-30",
        }),
    )
    .await;
    assert_eq!(resp.status(), 400);

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn naming_yourself_as_coverage_is_rejected() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-selfcover");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "working_day_panel",
            "travel_date": "2025-03-01",
            "reason": "Panel judging in another city",
            "covering_user_id": user_id.to_string(),
        }),
    )
    .await;
    assert_eq!(resp.status(), 400);

    common::cleanup_users(&pool, &[user_id]).await;
}

#[tokio::test]
async fn panel_submission_with_valid_coverage_succeeds() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-panel");
    let cover_email = unique_email("toil-panel-cover");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let (cover_id, _cover_pw) = common::create_test_user(&pool, "employee", &cover_email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = submit_toil(
        addr,
        &token,
        serde_json::json!({
            "scenario": "working_day_panel",
            "travel_date": "2025-03-01",
            "reason": "Panel judging in another city",
            "covering_user_id": cover_id.to_string(),
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["covering_user_id"].as_str().unwrap(), cover_id.to_string());
    // Panels earn no TOIL at submission time.
    assert_eq!(body["hours"].as_f64().unwrap(), 0.0);

    common::cleanup_users(&pool, &[user_id, cover_id]).await;
}

#[tokio::test]
async fn approved_accrual_raises_toil_balance_and_can_be_spent() {
    let (addr, pool) = common::setup_test_app().await;
    let employee_email = unique_email("toil-cycle-emp");
    let admin_email = unique_email("toil-cycle-adm");
    let (employee_id, employee_pw) = common::create_test_user(&pool, "employee", &employee_email).await;
    let (admin_id, admin_pw) = common::create_test_user(&pool, "admin", &admin_email).await;
    let employee_token = common::get_auth_token(addr, &employee_email, &employee_pw).await;
    let admin_token = common::get_auth_token(addr, &admin_email, &admin_pw).await;

    // Accrue 4 hours via an overnight day-off return.
    let resp = submit_toil(
        addr,
        &employee_token,
        serde_json::json!({
            "scenario": "overnight_day_off",
            "travel_date": "2025-03-01",
            "reason": "Overnight for regional show",
            "return_date": "2025-03-02",
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let accrual: serde_json::Value = resp.json().await.unwrap();
    let accrual_id = accrual["id"].as_str().unwrap();

    let resp = common::http_client()
        .patch(format!("http://{}/api/leave/{}/review", addr, accrual_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = common::http_client()
        .get(format!("http://{}/api/leave/balances", addr))
        .header("Authorization", format!("Bearer {}", employee_token))
        .send()
        .await
        .unwrap();
    let balances: serde_json::Value = resp.json().await.unwrap();
    let toil = balances
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["leave_type"] == "toil")
        .expect("toil balance present");
    assert_eq!(toil["total"].as_f64().unwrap(), 4.0);
    assert_eq!(toil["remaining"].as_f64().unwrap(), 4.0);

    // Spend 3 of the earned hours.
    let resp = common::http_client()
        .post(format!("http://{}/api/leave", addr))
        .header("Authorization", format!("Bearer {}", employee_token))
        .json(&serde_json::json!({
            "leave_type": "toil",
            "start_date": "2025-03-10",
            "end_date": "2025-03-10",
            "hours": 3.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let spend: serde_json::Value = resp.json().await.unwrap();
    let spend_id = spend["id"].as_str().unwrap();

    let resp = common::http_client()
        .patch(format!("http://{}/api/leave/{}/review", addr, spend_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (total, used): (f64, f64) = sqlx::query_as(
        "SELECT total, used FROM leave_balances WHERE user_id = $1 AND leave_type = 'toil'",
    )
    .bind(employee_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total, 4.0);
    assert_eq!(used, 3.0);

    common::cleanup_users(&pool, &[employee_id, admin_id]).await;
}

#[tokio::test]
async fn toil_spend_without_banked_hours_is_rejected() {
    let (addr, pool) = common::setup_test_app().await;
    let email = unique_email("toil-nospend");
    let (user_id, password) = common::create_test_user(&pool, "employee", &email).await;
    let token = common::get_auth_token(addr, &email, &password).await;

    let resp = common::http_client()
        .post(format!("http://{}/api/leave", addr))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "leave_type": "toil",
            "start_date": "2025-03-10",
            "end_date": "2025-03-10",
            "hours": 2.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400, "Nothing banked yet, nothing to spend");

    common::cleanup_users(&pool, &[user_id]).await;
}
