//! Public alliance routes
//!
//! Subdomain validation, the alliance landing view that subdomain requests
//! are rewritten to, and the page unknown subdomains are redirected to.

use alliance_portal_shared::{is_valid_slug, AllianceSummary};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ApiResponse;
use crate::{
    error::{ApiError, ApiResult},
    pnw::PnwAlliance,
    routing::{alliance_url, ResolvedAlliance},
    settings::{self, SettingKey},
    state::AppState,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidateSubdomainQuery {
    pub slug: Option<String>,
}

/// Landing view of a whitelisted alliance
#[derive(Debug, Serialize)]
pub struct AllianceLanding {
    pub alliance: AllianceSummary,
    pub subdomain_url: String,
    /// Live game data; `null` when the game API could not be reached
    pub pnw: Option<PnwAlliance>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Check whether a slug belongs to an active whitelisted alliance
pub async fn validate_subdomain(
    State(state): State<AppState>,
    Query(query): Query<ValidateSubdomainQuery>,
) -> ApiResult<Json<ApiResponse<AllianceSummary>>> {
    let slug = query
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Slug parameter is required".to_string()))?
        .to_lowercase();

    let not_found = || ApiError::NotFoundWithMessage("Alliance not found or not whitelisted".to_string());
    if !is_valid_slug(&slug) {
        return Err(not_found());
    }

    let alliance = state.whitelist.find_active(&slug).await?.ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(alliance)))
}

/// Alliance landing view: whitelist entry plus live game data
pub async fn landing(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    resolved: Option<Extension<ResolvedAlliance>>,
) -> ApiResult<Json<ApiResponse<AllianceLanding>>> {
    let alliance = match resolved {
        Some(Extension(ResolvedAlliance(alliance))) if alliance.slug == slug => alliance,
        _ => state
            .whitelist
            .find_active(&slug.to_lowercase())
            .await?
            .ok_or(ApiError::NotFound)?,
    };

    let api_key = match settings::get(&state.pool, SettingKey::GlobalPnwApiKey).await {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load global game API key");
            None
        }
    };

    let pnw = match state.pnw.alliance_by_id(alliance.alliance_id, api_key.as_deref()).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(alliance_id = alliance.alliance_id, error = %e, "Live alliance data unavailable");
            None
        }
    };

    Ok(Json(ApiResponse::ok(AllianceLanding {
        subdomain_url: alliance_url(&state.config.base_domain, &alliance.slug),
        alliance,
        pnw,
    })))
}

/// Target of the redirect for unknown or inactive alliance subdomains
pub async fn subdomain_not_found(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let contact = match settings::load(&state.pool).await {
        Ok(settings) => json!({
            "email": settings.admin_contact_email,
            "discord_invite_url": settings.discord_invite_url,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load contact settings");
            serde_json::Value::Null
        }
    };

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "SUBDOMAIN_NOT_FOUND",
                "message": "This alliance is not whitelisted for the portal. Contact an administrator to request access.",
            },
            "contact": contact,
        })),
    )
}
