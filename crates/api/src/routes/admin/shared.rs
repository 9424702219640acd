//! Helpers shared by admin routes

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::ApiError,
    settings::{self, SettingKey},
};

/// Log database error details for a failed admin operation
pub fn log_db_err(admin_id: Uuid, step: &'static str, e: &sqlx::Error) {
    if let Some(db) = e.as_database_error() {
        tracing::error!(
            %admin_id,
            step,
            code = ?db.code(),
            message = db.message(),
            table = ?db.table(),
            constraint = ?db.constraint(),
            "Database query failed"
        );
    } else {
        tracing::error!(%admin_id, step, error = ?e, "Non-database SQLx error");
    }
}

/// Whether an error is a unique-constraint violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

/// The configured global game API key, required for whitelist administration
pub async fn global_api_key(pool: &PgPool) -> Result<String, ApiError> {
    settings::get(pool, SettingKey::GlobalPnwApiKey)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Global PNW API key not configured. Please set it in admin settings.".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
