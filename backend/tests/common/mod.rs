#![allow(dead_code)]
use std::net::SocketAddr;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use toiltrack_backend::{api, config::LeavePolicy, toil::ToilPolicy, AppState};

fn database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set — tests write/delete data and should not run against a shared database")
}
const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";
const JWT_EXPIRY_HOURS: u64 = 12;

pub const ANNUAL_ALLOWANCE: f64 = 25.0;
pub const SICK_ALLOWANCE: f64 = 10.0;

/// Spin up a real Axum server on a random port, returning its address and the
/// database pool. All tests share the same dev database; test isolation comes
/// from creating unique users per test and cleaning up afterwards.
pub async fn setup_test_app() -> (SocketAddr, PgPool) {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url())
        .await
        .expect("Failed to connect to test database");

    // Run migrations to ensure schema is up-to-date
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: JWT_EXPIRY_HOURS,
        leave_policy: LeavePolicy {
            annual_allowance_days: ANNUAL_ALLOWANCE,
            sick_allowance_days: SICK_ALLOWANCE,
            toil: ToilPolicy::default(),
        },
    };

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, pool)
}

/// Create a test user with Argon2-hashed password plus seeded balances.
/// Returns (user_id, plaintext_password).
pub async fn create_test_user(pool: &PgPool, role: &str, email: &str) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let password = "testpass123";
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, role, is_active) \
         VALUES ($1, 'Test', 'User', $2, $3, $4::app_role, true)",
    )
    .bind(user_id)
    .bind(email)
    .bind(&hash)
    .bind(role)
    .execute(pool)
    .await
    .expect("Failed to create test user");

    for (leave_type, total) in [("annual", ANNUAL_ALLOWANCE), ("sick", SICK_ALLOWANCE), ("toil", 0.0)] {
        sqlx::query(
            "INSERT INTO leave_balances (user_id, leave_type, total, used) \
             VALUES ($1, $2::leave_type, $3, 0)",
        )
        .bind(user_id)
        .bind(leave_type)
        .bind(total)
        .execute(pool)
        .await
        .expect("Failed to seed balance");
    }

    (user_id, password.to_string())
}

/// Create an inactive test user. Returns (user_id, plaintext_password).
pub async fn create_inactive_user(pool: &PgPool, email: &str) -> (Uuid, String) {
    let (user_id, password) = create_test_user(pool, "employee", email).await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to deactivate user");
    (user_id, password)
}

/// Set the TOIL balance total for a user directly (for spend tests).
pub async fn set_toil_balance(pool: &PgPool, user_id: Uuid, total: f64) {
    sqlx::query("UPDATE leave_balances SET total = $2 WHERE user_id = $1 AND leave_type = 'toil'")
        .bind(user_id)
        .bind(total)
        .execute(pool)
        .await
        .expect("Failed to set TOIL balance");
}

/// Log in via the HTTP API and return the JWT token.
pub async fn get_auth_token(addr: SocketAddr, email: &str, password: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{}/api/auth/login", addr))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Login request failed");

    assert_eq!(resp.status(), 200, "Login should return 200");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    body["token"]
        .as_str()
        .expect("Response should contain token")
        .to_string()
}

/// Create a JWT token that is already expired (exp in the past).
/// Uses the same secret as the test app.
pub fn create_expired_token(user_id: Uuid) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use toiltrack_backend::auth::{Claims, Role};

    let now = time::OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        role: Role::Employee,
        exp: (now - time::Duration::hours(1)).unix_timestamp(), // expired 1 hour ago
        iat: (now - time::Duration::hours(2)).unix_timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create expired token")
}

/// Build a reqwest client (reusable across requests in a test).
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Clean up all data created for the given users. Call at the end of tests.
pub async fn cleanup_users(pool: &PgPool, user_ids: &[Uuid]) {
    for &id in user_ids {
        let cleanup_queries = [
            "DELETE FROM leave_requests WHERE user_id = $1 OR covering_user_id = $1 OR reviewed_by = $1",
            "DELETE FROM leave_balances WHERE user_id = $1",
            "DELETE FROM users WHERE id = $1",
        ];
        for q in cleanup_queries {
            let _ = sqlx::query(q).bind(id).execute(pool).await;
        }
    }
}
