//! Account setup: linking a game API key

use alliance_portal_shared::{AllianceRole, WhitelistedAlliance};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::ApiResponse;
use crate::{
    auth::SessionContext,
    error::{ApiError, ApiResult},
    pnw::{PnwAllianceRef, PnwNation},
    routing::alliance_url,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateApiKeyRequest {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NationSummary {
    pub id: i32,
    pub name: String,
    pub leader: String,
    pub score: f64,
    pub cities: i32,
    pub alliance: Option<PnwAllianceRef>,
}

impl From<&PnwNation> for NationSummary {
    fn from(nation: &PnwNation) -> Self {
        Self {
            id: nation.id,
            name: nation.nation_name.clone(),
            leader: nation.leader_name.clone(),
            score: nation.score,
            cities: nation.num_cities,
            alliance: nation.alliance.clone(),
        }
    }
}

/// Whether the nation's alliance is on the whitelist, and whether the user
/// was added to it
#[derive(Debug, Serialize)]
pub struct AllianceStatus {
    pub whitelisted: bool,
    pub alliance_id: i32,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub subdomain_url: Option<String>,
    /// A new membership was created by this request
    pub joined: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateApiKeyResponse {
    pub nation: NationSummary,
    pub alliance: Option<AllianceStatus>,
}

/// Validate a game API key, link it to the user and join their alliance
pub async fn validate_api_key(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(req): Json<ValidateApiKeyRequest>,
) -> ApiResult<Json<ApiResponse<ValidateApiKeyResponse>>> {
    let api_key = req
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::Validation("Valid API key is required".to_string()))?;

    let nation = state.pnw.validate_api_key(api_key).await?;

    sqlx::query(
        "UPDATE users SET pnw_api_key = $2, pnw_nation_id = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(ctx.user_id)
    .bind(api_key)
    .bind(nation.id)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id = %ctx.user_id, nation_id = nation.id, "Linked game API key");

    let alliance = match nation.alliance_id() {
        Some(alliance_id) => Some(join_alliance(&state, ctx.user_id, alliance_id, &nation).await?),
        None => None,
    };

    Ok(Json(ApiResponse::with_message(
        ValidateApiKeyResponse {
            nation: NationSummary::from(&nation),
            alliance,
        },
        "API key successfully validated and linked",
    )))
}

async fn join_alliance(
    state: &AppState,
    user_id: Uuid,
    alliance_id: i32,
    nation: &PnwNation,
) -> Result<AllianceStatus, ApiError> {
    let whitelisted: Option<WhitelistedAlliance> = sqlx::query_as(
        "SELECT * FROM whitelisted_alliances WHERE alliance_id = $1 AND is_active = TRUE",
    )
    .bind(alliance_id)
    .fetch_optional(&state.pool)
    .await?;

    let Some(entry) = whitelisted else {
        return Ok(AllianceStatus {
            whitelisted: false,
            alliance_id,
            name: nation.alliance.as_ref().map(|a| a.name.clone()),
            slug: None,
            subdomain_url: None,
            joined: false,
        });
    };

    let joined = add_member(&state.pool, user_id, alliance_id, AllianceRole::Member).await?;
    if joined {
        tracing::info!(%user_id, alliance_id, "Joined whitelisted alliance");
    }

    Ok(AllianceStatus {
        whitelisted: true,
        alliance_id,
        subdomain_url: Some(alliance_url(&state.config.base_domain, &entry.slug)),
        name: Some(entry.alliance_name),
        slug: Some(entry.slug),
        joined,
    })
}

/// Add a membership; existing memberships keep their role
async fn add_member(
    pool: &PgPool,
    user_id: Uuid,
    alliance_id: i32,
    role: AllianceRole,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_alliances (user_id, alliance_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, alliance_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(alliance_id)
    .bind(role)
    .execute(pool)
    .await?;

    let joined = result.rows_affected() == 1;
    if joined {
        tracing::info!(%user_id, alliance_id, %role, "Added alliance member");
    }
    Ok(joined)
}
