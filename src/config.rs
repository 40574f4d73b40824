// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Passing threshold (percentage) applied when a quiz does not set its own.
pub const DEFAULT_PASSING_SCORE: i64 = 70;

/// Period of one countdown step.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single free-text answer.
pub const MAX_ANSWER_LENGTH: u64 = 2000;

/// How long a submitted session is remembered for status and duplicate submits.
pub const CLOSED_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            database_url,
            rust_log,
            bind_addr,
        }
    }
}
