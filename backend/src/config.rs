use anyhow::Context;

use crate::toil::ToilPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub listen_addr: String,
    pub cors_origins: Vec<String>,
    pub leave_policy: LeavePolicy,
}

/// Allowance and crediting knobs. Read once at startup; handlers receive
/// these through `AppState` instead of touching the environment.
#[derive(Clone, Copy, Debug)]
pub struct LeavePolicy {
    /// Annual leave seeded for a new user, in days.
    pub annual_allowance_days: f64,
    /// Sick leave seeded for a new user, in days.
    pub sick_allowance_days: f64,
    pub toil: ToilPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters for security");
        }
        if jwt_secret.contains("change_me") {
            anyhow::bail!("JWT_SECRET contains placeholder value — set a real secret before running");
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret,
            jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", 12)?,
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            leave_policy: LeavePolicy {
                annual_allowance_days: env_parse("ANNUAL_ALLOWANCE_DAYS", 25.0)?,
                sick_allowance_days: env_parse("SICK_ALLOWANCE_DAYS", 10.0)?,
                toil: ToilPolicy {
                    day_off_credit_hours: env_parse("TOIL_DAY_OFF_CREDIT_HOURS", 4.0)?,
                    max_daily_credit_hours: env_parse("TOIL_MAX_DAILY_CREDIT_HOURS", 8.0)?,
                },
            },
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", key, v)),
        Err(_) => Ok(default),
    }
}
