//! Whitelist administration

use alliance_portal_shared::{slug_from_name, WhitelistedAlliance};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::shared::{global_api_key, is_unique_violation, log_db_err};
use crate::{
    auth::AdminContext,
    error::{ApiError, ApiResult},
    routes::ApiResponse,
    routing::{alliance_url, RESERVED_LABELS},
    state::AppState,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAllianceRequest {
    pub alliance_id: Option<i32>,
}

/// Whitelist entry with its public landing URL
#[derive(Debug, Serialize)]
pub struct WhitelistEntry {
    #[serde(flatten)]
    pub alliance: WhitelistedAlliance,
    pub subdomain_url: String,
}

impl WhitelistEntry {
    fn new(alliance: WhitelistedAlliance, base_domain: &str) -> Self {
        Self {
            subdomain_url: alliance_url(base_domain, &alliance.slug),
            alliance,
        }
    }
}

/// Subdomain slug for an alliance name, rejecting names that yield no usable label
pub fn whitelist_slug(name: &str) -> Result<String, ApiError> {
    let slug = slug_from_name(name);
    if slug.is_empty() {
        return Err(ApiError::Validation(format!(
            "Alliance name '{name}' does not produce a usable subdomain"
        )));
    }
    if RESERVED_LABELS.contains(&slug.as_str()) {
        return Err(ApiError::Validation(format!("Subdomain '{slug}' is reserved")));
    }
    Ok(slug)
}

/// Unique constraint on the game alliance id (Postgres default name)
const ALLIANCE_ID_UNIQUE: &str = "whitelisted_alliances_alliance_id_key";

/// Map a failed whitelist write, telling a concurrent add of the same
/// alliance apart from a slug taken by another alliance
fn save_conflict(admin: &AdminContext, alliance_id: i32, slug: &str, e: sqlx::Error) -> ApiError {
    if !is_unique_violation(&e) {
        log_db_err(admin.user_id, "save_whitelist_entry", &e);
        return e.into();
    }

    let constraint = e.as_database_error().and_then(|db| db.constraint());
    if constraint == Some(ALLIANCE_ID_UNIQUE) {
        tracing::warn!(alliance_id, "Alliance whitelisted concurrently");
        ApiError::Conflict("Alliance is already whitelisted".to_string())
    } else {
        tracing::warn!(%slug, "Subdomain already taken by another alliance");
        ApiError::Conflict(format!("Subdomain '{slug}' is already used by another alliance"))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List active whitelist entries by name
pub async fn list_alliances(
    State(state): State<AppState>,
    _admin: AdminContext,
) -> ApiResult<Json<ApiResponse<Vec<WhitelistEntry>>>> {
    let alliances: Vec<WhitelistedAlliance> = sqlx::query_as(
        "SELECT * FROM whitelisted_alliances WHERE is_active = TRUE ORDER BY alliance_name",
    )
    .fetch_all(&state.pool)
    .await?;

    let entries = alliances
        .into_iter()
        .map(|a| WhitelistEntry::new(a, &state.config.base_domain))
        .collect();

    Ok(Json(ApiResponse::ok(entries)))
}

/// Whitelist an alliance by its game id
///
/// The name and acronym come from the game API; a previously removed entry
/// is reactivated with refreshed details.
pub async fn add_alliance(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(req): Json<AddAllianceRequest>,
) -> ApiResult<Json<ApiResponse<WhitelistEntry>>> {
    let alliance_id = req
        .alliance_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Validation("Valid alliance ID is required".to_string()))?;

    let existing: Option<WhitelistedAlliance> =
        sqlx::query_as("SELECT * FROM whitelisted_alliances WHERE alliance_id = $1")
            .bind(alliance_id)
            .fetch_optional(&state.pool)
            .await?;

    if existing.as_ref().is_some_and(|a| a.is_active) {
        return Err(ApiError::Conflict("Alliance is already whitelisted".to_string()));
    }

    let api_key = global_api_key(&state.pool).await?;
    let pnw_alliance = state
        .pnw
        .alliance_by_id(alliance_id, Some(&api_key))
        .await?
        .ok_or_else(|| ApiError::NotFoundWithMessage("Alliance not found in Politics and War".to_string()))?;

    let slug = whitelist_slug(&pnw_alliance.name)?;
    let acronym = pnw_alliance.acronym().map(str::to_string);

    let saved: WhitelistedAlliance = if existing.is_some() {
        sqlx::query_as(
            r#"
            UPDATE whitelisted_alliances
            SET alliance_name = $2, alliance_acronym = $3, slug = $4,
                added_by_user_id = $5, is_active = TRUE, updated_at = NOW()
            WHERE alliance_id = $1
            RETURNING *
            "#,
        )
        .bind(alliance_id)
        .bind(&pnw_alliance.name)
        .bind(&acronym)
        .bind(&slug)
        .bind(admin.user_id)
        .fetch_one(&state.pool)
        .await
        .map_err(|e| save_conflict(&admin, alliance_id, &slug, e))?
    } else {
        sqlx::query_as(
            r#"
            INSERT INTO whitelisted_alliances
                (alliance_id, alliance_name, alliance_acronym, slug, added_by_user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(alliance_id)
        .bind(&pnw_alliance.name)
        .bind(&acronym)
        .bind(&slug)
        .bind(admin.user_id)
        .fetch_one(&state.pool)
        .await
        .map_err(|e| save_conflict(&admin, alliance_id, &slug, e))?
    };

    tracing::info!(
        admin_id = %admin.user_id,
        alliance_id,
        %slug,
        reactivated = existing.is_some(),
        "Alliance whitelisted"
    );

    Ok(Json(ApiResponse::with_message(
        WhitelistEntry::new(saved, &state.config.base_domain),
        "Alliance successfully added to whitelist",
    )))
}

/// Remove an alliance from the whitelist (soft delete)
pub async fn remove_alliance(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(alliance_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<WhitelistedAlliance>>> {
    let removed: Option<WhitelistedAlliance> = sqlx::query_as(
        r#"
        UPDATE whitelisted_alliances
        SET is_active = FALSE, updated_at = NOW()
        WHERE alliance_id = $1 AND is_active = TRUE
        RETURNING *
        "#,
    )
    .bind(alliance_id)
    .fetch_optional(&state.pool)
    .await?;

    let removed = removed.ok_or_else(|| {
        ApiError::NotFoundWithMessage("Alliance is not on the whitelist".to_string())
    })?;

    tracing::info!(admin_id = %admin.user_id, alliance_id, slug = %removed.slug, "Alliance removed from whitelist");

    Ok(Json(ApiResponse::with_message(removed, "Alliance removed from whitelist")))
}
