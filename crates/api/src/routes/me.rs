//! Signed-in user routes: dashboard view and nation debugging

use alliance_portal_shared::AllianceRole;
use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::ApiResponse;
use crate::{
    auth::SessionContext,
    error::{ApiError, ApiResult},
    pnw::{PnwAllianceRef, PnwNation},
    routing::alliance_url,
    state::AppState,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, FromRow)]
struct MembershipRow {
    alliance_id: i32,
    role: AllianceRole,
    joined_at: OffsetDateTime,
    alliance_name: Option<String>,
    alliance_acronym: Option<String>,
    slug: Option<String>,
    is_active: Option<bool>,
}

/// An alliance the user belongs to
#[derive(Debug, Serialize)]
pub struct Membership {
    pub alliance_id: i32,
    pub role: AllianceRole,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    pub name: Option<String>,
    pub acronym: Option<String>,
    pub slug: Option<String>,
    /// Landing page, present while the alliance is whitelisted
    pub subdomain_url: Option<String>,
}

impl Membership {
    fn from_row(row: MembershipRow, base_domain: &str) -> Self {
        let subdomain_url = match (&row.slug, row.is_active) {
            (Some(slug), Some(true)) => Some(alliance_url(base_domain, slug)),
            _ => None,
        };
        Self {
            alliance_id: row.alliance_id,
            role: row.role,
            joined_at: row.joined_at,
            name: row.alliance_name,
            acronym: row.alliance_acronym,
            slug: row.slug,
            subdomain_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: SessionContext,
    /// The user still has to link a game API key
    pub setup_required: bool,
    pub alliances: Vec<Membership>,
}

#[derive(Debug, Serialize)]
pub struct NationDebug {
    pub nation: PnwNation,
    pub has_alliance: bool,
    pub alliance_id: Option<i32>,
    pub alliance: Option<PnwAllianceRef>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Dashboard view for the signed-in user
pub async fn dashboard(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    let rows: Vec<MembershipRow> = sqlx::query_as(
        r#"
        SELECT ua.alliance_id, ua.role, ua.created_at AS joined_at,
               wa.alliance_name, wa.alliance_acronym, wa.slug, wa.is_active
        FROM user_alliances ua
        LEFT JOIN whitelisted_alliances wa ON wa.alliance_id = ua.alliance_id
        WHERE ua.user_id = $1
        ORDER BY ua.created_at
        "#,
    )
    .bind(ctx.user_id)
    .fetch_all(&state.pool)
    .await?;

    let alliances = rows
        .into_iter()
        .map(|row| Membership::from_row(row, &state.config.base_domain))
        .collect();

    Ok(Json(ApiResponse::ok(Dashboard {
        setup_required: !ctx.has_api_key,
        user: ctx,
        alliances,
    })))
}

/// Nation data behind the user's stored API key
pub async fn debug_nation(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> ApiResult<Json<ApiResponse<NationDebug>>> {
    let api_key: Option<String> = sqlx::query_scalar("SELECT pnw_api_key FROM users WHERE id = $1")
        .bind(ctx.user_id)
        .fetch_one(&state.pool)
        .await?;

    let api_key = api_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No API key found for user".to_string()))?;

    let nation = state.pnw.validate_api_key(&api_key).await?;
    let alliance_id = nation.alliance_id();

    Ok(Json(ApiResponse::ok(NationDebug {
        has_alliance: alliance_id.is_some(),
        alliance_id,
        alliance: nation.alliance.clone(),
        nation,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(slug: Option<&str>, is_active: Option<bool>) -> MembershipRow {
        MembershipRow {
            alliance_id: 913,
            role: AllianceRole::Member,
            joined_at: OffsetDateTime::UNIX_EPOCH,
            alliance_name: slug.map(|_| "Acme Corp".to_string()),
            alliance_acronym: None,
            slug: slug.map(str::to_string),
            is_active,
        }
    }

    #[test]
    fn test_membership_links_active_alliances() {
        let membership = Membership::from_row(row(Some("acme"), Some(true)), "example.com");
        assert_eq!(membership.subdomain_url.as_deref(), Some("https://acme.example.com"));
        assert_eq!(membership.name.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_membership_without_active_whitelist_entry() {
        let inactive = Membership::from_row(row(Some("acme"), Some(false)), "example.com");
        assert_eq!(inactive.subdomain_url, None);

        let removed = Membership::from_row(row(None, None), "example.com");
        assert_eq!(removed.subdomain_url, None);
        assert_eq!(removed.alliance_id, 913);
    }
}
