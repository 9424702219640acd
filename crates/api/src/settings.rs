//! Admin-managed runtime settings
//!
//! Settings live in the `admin_settings` table keyed by [`SettingKey`]. Only
//! recognized keys are ever read or written, and each key validates its own
//! values before they are stored.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A recognized admin setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Game API key used for whitelist administration
    GlobalPnwApiKey,
    /// Address shown to users who need an alliance whitelisted
    AdminContactEmail,
    /// Invite link to the community Discord server
    DiscordInviteUrl,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::GlobalPnwApiKey,
        SettingKey::AdminContactEmail,
        SettingKey::DiscordInviteUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::GlobalPnwApiKey => "global_pnw_api_key",
            SettingKey::AdminContactEmail => "admin_contact_email",
            SettingKey::DiscordInviteUrl => "discord_invite_url",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SettingKey::GlobalPnwApiKey => "Politics and War API key used to look up alliances",
            SettingKey::AdminContactEmail => "Contact address for whitelist requests",
            SettingKey::DiscordInviteUrl => "Invite link to the community Discord server",
        }
    }

    /// Secret values are masked when listed
    pub fn is_secret(&self) -> bool {
        matches!(self, SettingKey::GlobalPnwApiKey)
    }

    /// Validate and normalize a value for this key
    ///
    /// Blank values clear the setting and normalize to `None`.
    pub fn validate(&self, value: Option<&str>) -> Result<Option<String>, SettingsError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        let invalid = |reason: &str| SettingsError::InvalidValue {
            key: self.as_str(),
            reason: reason.to_string(),
        };

        match self {
            SettingKey::GlobalPnwApiKey => {
                if value.len() < 8 || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(invalid("API key must be at least 8 alphanumeric characters"));
                }
            }
            SettingKey::AdminContactEmail => {
                let valid = match value.split_once('@') {
                    Some((local, domain)) => {
                        !local.is_empty()
                            && domain.contains('.')
                            && !domain.starts_with('.')
                            && !domain.ends_with('.')
                            && !domain.contains('@')
                            && !value.chars().any(char::is_whitespace)
                    }
                    None => false,
                };
                if !valid {
                    return Err(invalid("must be a valid email address"));
                }
            }
            SettingKey::DiscordInviteUrl => {
                let url = url::Url::parse(value).map_err(|_| invalid("must be a valid URL"))?;
                if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                    return Err(invalid("must be an http(s) URL"));
                }
            }
        }

        Ok(Some(value.to_string()))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unknown setting key: {0}")]
    UnknownKey(String),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("Settings storage error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored setting row
#[derive(Debug, Clone, FromRow)]
pub struct SettingRow {
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub updated_by_user_id: Option<Uuid>,
    pub updated_at: OffsetDateTime,
}

/// Typed view of every recognized setting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSettings {
    pub global_pnw_api_key: Option<String>,
    pub admin_contact_email: Option<String>,
    pub discord_invite_url: Option<String>,
}

impl AdminSettings {
    /// Build from stored rows, ignoring keys that are no longer recognized
    pub fn from_rows(rows: &[SettingRow]) -> Self {
        let mut settings = AdminSettings::default();
        for row in rows {
            match row.setting_key.parse::<SettingKey>() {
                Ok(key) => settings.set(key, row.setting_value.clone()),
                Err(_) => tracing::debug!(key = %row.setting_key, "Ignoring unrecognized stored setting"),
            }
        }
        settings
    }

    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::GlobalPnwApiKey => self.global_pnw_api_key.as_deref(),
            SettingKey::AdminContactEmail => self.admin_contact_email.as_deref(),
            SettingKey::DiscordInviteUrl => self.discord_invite_url.as_deref(),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: Option<String>) {
        let slot = match key {
            SettingKey::GlobalPnwApiKey => &mut self.global_pnw_api_key,
            SettingKey::AdminContactEmail => &mut self.admin_contact_email,
            SettingKey::DiscordInviteUrl => &mut self.discord_invite_url,
        };
        *slot = value.filter(|v| !v.trim().is_empty());
    }
}

/// A setting as listed to administrators
#[derive(Debug, Clone, Serialize)]
pub struct SettingView {
    pub setting_key: &'static str,
    pub setting_value: Option<String>,
    pub description: &'static str,
    pub is_secret: bool,
    pub is_set: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl SettingView {
    pub fn new(key: SettingKey, value: Option<&str>, updated_at: Option<OffsetDateTime>) -> Self {
        Self {
            setting_key: key.as_str(),
            setting_value: value.map(|v| if key.is_secret() { mask_secret(v) } else { v.to_string() }),
            description: key.description(),
            is_secret: key.is_secret(),
            is_set: value.is_some(),
            updated_at,
        }
    }
}

/// Views of every recognized key, in declaration order, with secrets masked
pub fn setting_views(rows: &[SettingRow]) -> Vec<SettingView> {
    let settings = AdminSettings::from_rows(rows);
    SettingKey::ALL
        .into_iter()
        .map(|key| {
            let updated_at = rows
                .iter()
                .find(|row| row.setting_key == key.as_str())
                .map(|row| row.updated_at);
            SettingView::new(key, settings.get(key), updated_at)
        })
        .collect()
}

/// Mask a secret, keeping only its last four characters
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("********{tail}")
}

// =============================================================================
// Storage
// =============================================================================

/// All stored rows for recognized keys
pub async fn load_rows(pool: &PgPool) -> Result<Vec<SettingRow>, SettingsError> {
    let keys: Vec<&str> = SettingKey::ALL.iter().map(SettingKey::as_str).collect();
    let rows: Vec<SettingRow> = sqlx::query_as(
        r#"
        SELECT setting_key, setting_value, updated_by_user_id, updated_at
        FROM admin_settings
        WHERE setting_key = ANY($1)
        ORDER BY setting_key
        "#,
    )
    .bind(&keys)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn load(pool: &PgPool) -> Result<AdminSettings, SettingsError> {
    Ok(AdminSettings::from_rows(&load_rows(pool).await?))
}

/// Current value of one setting
pub async fn get(pool: &PgPool, key: SettingKey) -> Result<Option<String>, SettingsError> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT setting_value FROM admin_settings WHERE setting_key = $1")
            .bind(key.as_str())
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten().filter(|v| !v.trim().is_empty()))
}

/// Validate and store a setting value
pub async fn update(
    pool: &PgPool,
    key: SettingKey,
    value: Option<&str>,
    updated_by: Uuid,
) -> Result<SettingRow, SettingsError> {
    let value = key.validate(value)?;

    let row: SettingRow = sqlx::query_as(
        r#"
        INSERT INTO admin_settings (setting_key, setting_value, updated_by_user_id, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (setting_key) DO UPDATE
            SET setting_value = EXCLUDED.setting_value,
                updated_by_user_id = EXCLUDED.updated_by_user_id,
                updated_at = NOW()
        RETURNING setting_key, setting_value, updated_by_user_id, updated_at
        "#,
    )
    .bind(key.as_str())
    .bind(&value)
    .bind(updated_by)
    .fetch_one(pool)
    .await?;

    tracing::info!(setting = %key, cleared = value.is_none(), %updated_by, "Admin setting updated");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: Option<&str>) -> SettingRow {
        SettingRow {
            setting_key: key.to_string(),
            setting_value: value.map(str::to_string),
            updated_by_user_id: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_key_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!(matches!(
            "site_theme".parse::<SettingKey>(),
            Err(SettingsError::UnknownKey(k)) if k == "site_theme"
        ));
    }

    #[test]
    fn test_blank_values_clear() {
        assert_eq!(SettingKey::AdminContactEmail.validate(None).unwrap(), None);
        assert_eq!(SettingKey::AdminContactEmail.validate(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_api_key_validation() {
        let key = SettingKey::GlobalPnwApiKey;
        assert_eq!(key.validate(Some(" abc123def456 ")).unwrap().as_deref(), Some("abc123def456"));
        assert!(key.validate(Some("short")).is_err());
        assert!(key.validate(Some("has spaces in it")).is_err());
    }

    #[test]
    fn test_email_validation() {
        let key = SettingKey::AdminContactEmail;
        assert!(key.validate(Some("admin@example.com")).is_ok());
        assert!(key.validate(Some("admin")).is_err());
        assert!(key.validate(Some("@example.com")).is_err());
        assert!(key.validate(Some("admin@localhost")).is_err());
        assert!(key.validate(Some("a b@example.com")).is_err());
    }

    #[test]
    fn test_url_validation() {
        let key = SettingKey::DiscordInviteUrl;
        assert!(key.validate(Some("https://discord.gg/abc")).is_ok());
        assert!(key.validate(Some("discord.gg/abc")).is_err());
        assert!(key.validate(Some("javascript:alert(1)")).is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdef0123456789"), "********6789");
        assert_eq!(mask_secret("short"), "********");
    }

    #[test]
    fn test_from_rows_ignores_unknown_keys() {
        let settings = AdminSettings::from_rows(&[
            row("global_pnw_api_key", Some("abcdef0123456789")),
            row("admin_contact_email", Some("")),
            row("legacy_banner", Some("hello")),
        ]);
        assert_eq!(settings.global_pnw_api_key.as_deref(), Some("abcdef0123456789"));
        assert_eq!(settings.admin_contact_email, None);
        assert_eq!(settings.discord_invite_url, None);
    }

    #[test]
    fn test_views_list_every_key_and_mask_secrets() {
        let views = setting_views(&[
            row("global_pnw_api_key", Some("abcdef0123456789")),
            row("discord_invite_url", Some("https://discord.gg/abc")),
        ]);

        let keys: Vec<&str> = views.iter().map(|v| v.setting_key).collect();
        assert_eq!(keys, vec!["global_pnw_api_key", "admin_contact_email", "discord_invite_url"]);

        assert_eq!(views[0].setting_value.as_deref(), Some("********6789"));
        assert!(views[0].is_secret);
        assert!(!views[1].is_set);
        assert_eq!(views[1].updated_at, None);
        assert_eq!(views[2].setting_value.as_deref(), Some("https://discord.gg/abc"));
    }
}
