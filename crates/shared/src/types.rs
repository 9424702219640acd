//! Common types used across the alliance portal

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Role a user holds inside a whitelisted alliance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AllianceRole {
    #[default]
    Member,
    Officer,
    Leader,
}

impl AllianceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Officer => "officer",
            Self::Leader => "leader",
        }
    }
}

impl fmt::Display for AllianceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rows
// =============================================================================

/// A portal user, keyed by their Discord identity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub discord_id: String,
    pub discord_username: String,
    pub discord_avatar: Option<String>,
    #[serde(skip_serializing)]
    pub pnw_api_key: Option<String>,
    pub pnw_nation_id: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn has_api_key(&self) -> bool {
        self.pnw_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// An alliance an administrator has granted a subdomain
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WhitelistedAlliance {
    pub id: Uuid,
    /// Alliance id in the game
    pub alliance_id: i32,
    pub alliance_name: String,
    pub alliance_acronym: Option<String>,
    /// Subdomain label, unique across all entries
    pub slug: String,
    pub added_by_user_id: Option<Uuid>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Identity fields of a whitelist entry, as reported by subdomain validation
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AllianceSummary {
    pub id: Uuid,
    pub alliance_id: i32,
    pub name: String,
    pub acronym: Option<String>,
    pub slug: String,
    pub is_active: bool,
}
