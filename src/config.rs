// src/config.rs

use std::env;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Lifetime of tokens minted by `issue_token`, in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
}

impl Config {
    /// Reads configuration from the environment (and `.env`, if present).
    ///
    /// Returns the name of the first required variable that is missing.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
        })
    }
}
