use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Shared secret compared against the x-webhook-secret header.
    /// Webhook auth is disabled when unset.
    pub webhook_secret: Option<String>,
    /// How long a pending claim is honoured before the reaper removes it.
    pub pending_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let pending_ttl_hours = match std::env::var("PENDING_TTL_HOURS") {
            Ok(raw) => raw.parse().map_err(|_| {
                config::ConfigError::Message(format!("invalid PENDING_TTL_HOURS: {}", raw))
            })?,
            Err(_) => 24,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/milesponsor".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            webhook_secret: std::env::var("WEBHOOK_SECRET").ok(),
            pending_ttl_hours,
        })
    }
}
