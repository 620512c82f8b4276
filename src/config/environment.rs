use std::env;

use crate::services::hashing::Argon2Config;

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub app_env: AppEnv,
    pub argon2: Argon2Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_production(&self) -> bool {
        matches!(self, AppEnv::Production)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let app_env = match env::var("APP_ENV").as_deref() {
            Ok("production") => AppEnv::Production,
            _ => AppEnv::Development,
        };

        // Argon2 cost is operationally tunable; the defaults favour
        // throughput over the library defaults (m=8MB, t=2, p=1).
        let argon2 = Argon2Config {
            memory_kib: parse_env_u32("ARGON2_MEMORY_KIB", 8192)?,
            iterations: parse_env_u32("ARGON2_ITERATIONS", 2)?,
            parallelism: parse_env_u32("ARGON2_PARALLELISM", 1)?,
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_env_u32("DATABASE_MAX_CONNECTIONS", 10)?,
            app_env,
            argon2,
        })
    }
}

fn parse_env_u32(key: &str, default: u32) -> Result<u32, String> {
    match env::var(key) {
        Ok(v) => v
            .parse::<u32>()
            .map_err(|_| format!("{} must be a positive integer", key)),
        Err(_) => Ok(default),
    }
}
