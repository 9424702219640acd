//! Application configuration

use std::collections::HashSet;
use std::env;

/// Default GraphQL endpoint of the game API
pub const DEFAULT_PNW_API_URL: &str = "https://api.politicsandwar.com/graphql";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_EXPIRY_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub base_domain: String, // e.g. "example.com" in production, "localhost:3000" in development

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Sessions
    pub session_secret: String,
    pub session_expiry_hours: i64,
    pub session_cookie_name: String,
    pub admin_discord_ids: HashSet<String>,

    // Game API
    pub pnw_api_url: String,
    pub pnw_request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            base_domain: env::var("BASE_DOMAIN")
                .map(|d| d.trim().to_lowercase())
                .unwrap_or_else(|_| "localhost:3000".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Sessions
            session_secret: {
                let secret = env::var("SESSION_SECRET")
                    .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "SESSION_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            session_expiry_hours: {
                let hours: i64 = env::var("SESSION_EXPIRY_HOURS")
                    .unwrap_or_else(|_| "168".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("SESSION_EXPIRY_HOURS must be an integer"))?;
                if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&hours) {
                    return Err(ConfigError::Invalid(
                        "SESSION_EXPIRY_HOURS must be between 1 and 8760",
                    ));
                }
                hours
            },
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "portal_session".to_string()),
            admin_discord_ids: parse_id_list(&env::var("ADMIN_DISCORD_IDS").unwrap_or_default()),

            // Game API
            pnw_api_url: env::var("PNW_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PNW_API_URL.to_string()),
            pnw_request_timeout_ms: env::var("PNW_REQUEST_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10000),
        })
    }

    /// Whether the given Discord account is on the admin allowlist
    pub fn is_admin(&self, discord_id: &str) -> bool {
        self.admin_discord_ids.contains(discord_id)
    }
}

/// Parse a comma separated id list, ignoring blanks
fn parse_id_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
