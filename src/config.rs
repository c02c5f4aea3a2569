// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Length of the code students type to join a class.
pub const JOIN_CODE_LENGTH: usize = 8;

/// Number of option slots on a multiple choice question (A through D).
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
    pub log_dir: String,
}

impl Config {
    /// Reads the configuration from the environment (and `.env`).
    ///
    /// Malformed numeric values fall back to their defaults. The returned
    /// warnings describe each fallback; they are logged by the caller once
    /// the tracing subscriber is installed.
    pub fn from_env() -> (Self, Vec<String>) {
        dotenv().ok();
        let mut warnings = Vec::new();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or("JWT_EXPIRATION", 86_400, &mut warnings);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let server_port = parse_or("SERVER_PORT", 3000, &mut warnings);

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let config = Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
            log_dir,
        };
        (config, warnings)
    }
}

/// Reads a numeric variable, keeping the default when it is unset or malformed.
/// A malformed value adds a line to `warnings`.
fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("Invalid value for {}: {:?}, using {}", key, raw, default));
            default
        }),
        Err(_) => default,
    }
}
