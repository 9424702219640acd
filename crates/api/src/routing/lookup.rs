//! Whitelist lookup used by the subdomain router

use alliance_portal_shared::AllianceSummary;
use async_trait::async_trait;
use sqlx::PgPool;

/// Finds the active whitelisted alliance for a subdomain slug
#[async_trait]
pub trait WhitelistLookup: Send + Sync {
    /// Active alliance with this slug, or `None` if there is none
    async fn find_active(&self, slug: &str) -> Result<Option<AllianceSummary>, LookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Whitelist lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Postgres-backed whitelist
#[derive(Clone)]
pub struct PgWhitelistLookup {
    pool: PgPool,
}

impl PgWhitelistLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WhitelistLookup for PgWhitelistLookup {
    async fn find_active(&self, slug: &str) -> Result<Option<AllianceSummary>, LookupError> {
        let alliance: Option<AllianceSummary> = sqlx::query_as(
            r#"
            SELECT id, alliance_id, alliance_name AS name, alliance_acronym AS acronym, slug, is_active
            FROM whitelisted_alliances
            WHERE slug = $1 AND is_active = TRUE
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(alliance)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory lookups for router and handler tests

    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Whitelist backed by a fixed list, recording every slug queried
    #[derive(Default)]
    pub struct StaticWhitelist {
        alliances: Vec<AllianceSummary>,
        pub queried: Mutex<Vec<String>>,
    }

    impl StaticWhitelist {
        pub fn with(entries: &[(&str, i32, &str, bool)]) -> Self {
            let alliances = entries
                .iter()
                .map(|(slug, alliance_id, name, is_active)| AllianceSummary {
                    id: Uuid::new_v4(),
                    alliance_id: *alliance_id,
                    name: name.to_string(),
                    acronym: None,
                    slug: slug.to_string(),
                    is_active: *is_active,
                })
                .collect();
            Self { alliances, queried: Mutex::new(Vec::new()) }
        }

        pub fn queried(&self) -> Vec<String> {
            self.queried.lock().map(|q| q.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl WhitelistLookup for StaticWhitelist {
        async fn find_active(&self, slug: &str) -> Result<Option<AllianceSummary>, LookupError> {
            if let Ok(mut queried) = self.queried.lock() {
                queried.push(slug.to_string());
            }
            Ok(self
                .alliances
                .iter()
                .find(|a| a.slug == slug && a.is_active)
                .cloned())
        }
    }

    /// Whitelist whose store is always down
    pub struct FailingWhitelist;

    #[async_trait]
    impl WhitelistLookup for FailingWhitelist {
        async fn find_active(&self, _slug: &str) -> Result<Option<AllianceSummary>, LookupError> {
            Err(LookupError::Database(sqlx::Error::PoolTimedOut))
        }
    }
}
