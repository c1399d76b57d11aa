use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

#[derive(Clone)]
pub struct Settings {
    pub port: u16,
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiration_minutes: i64,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn new() -> Result<Self> {
        let port: u16 = parsed_or("PORT", 3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Self {
            port,
            addr,
            database_url,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5),
            jwt_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "medion".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "medion-clients".to_string()),
            // one day
            jwt_expiration_minutes: parsed_or("JWT_EXPIRATION_MINUTES", 1440),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: String::new(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "medion".to_string(),
            jwt_audience: "medion-clients".to_string(),
            jwt_expiration_minutes: 60,
        }
    }
}
