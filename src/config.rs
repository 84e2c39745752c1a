use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::warn;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_signup_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
    /// Default page size for payroll history.
    pub history_limit: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn number_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, fallback = %default, "Unparseable number, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Log directory, readable before the rest of the configuration is validated.
pub fn log_dir_from_env() -> String {
    env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: number_or("ACCESS_TOKEN_TTL", 900), // 15 min

            rate_login_per_min: number_or("RATE_LOGIN_PER_MIN", 60),
            rate_signup_per_min: number_or("RATE_SIGNUP_PER_MIN", 30),
            rate_protected_per_min: number_or("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: log_dir_from_env(),
            history_limit: number_or("PAYROLL_HISTORY_LIMIT", 50),
        })
    }
}
