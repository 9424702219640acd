//! Alliance search against the game API

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::shared::global_api_key;
use crate::{
    auth::AdminContext,
    error::{ApiError, ApiResult},
    pnw::PnwAlliance,
    routes::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub id: Option<String>,
}

/// A parsed search request
#[derive(Debug, PartialEq, Eq)]
pub enum AllianceSearch {
    ById(i32),
    ByName(String),
}

impl TryFrom<SearchQuery> for AllianceSearch {
    type Error = ApiError;

    /// An id takes precedence over a name
    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if let Some(id) = non_blank(query.id) {
            return id
                .parse::<i32>()
                .ok()
                .filter(|id| *id > 0)
                .map(AllianceSearch::ById)
                .ok_or_else(|| ApiError::Validation(format!("Invalid alliance ID: {id}")));
        }

        non_blank(query.q)
            .map(AllianceSearch::ByName)
            .ok_or_else(|| ApiError::BadRequest("Search query or alliance ID is required".to_string()))
    }
}

/// Search alliances by name (`q`) or game id (`id`)
pub async fn search_alliances(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<PnwAlliance>>>> {
    let search = AllianceSearch::try_from(query)?;
    let api_key = global_api_key(&state.pool).await?;

    let alliances = match search {
        AllianceSearch::ById(id) => state
            .pnw
            .alliance_by_id(id, Some(&api_key))
            .await?
            .into_iter()
            .collect(),
        AllianceSearch::ByName(name) => state.pnw.search_alliances(&name, Some(&api_key)).await?,
    };

    tracing::debug!(results = alliances.len(), "Alliance search");
    Ok(Json(ApiResponse::ok(alliances)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(q: Option<&str>, id: Option<&str>) -> SearchQuery {
        SearchQuery {
            q: q.map(str::to_string),
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(
            AllianceSearch::try_from(query(Some(" Rose "), None)).unwrap(),
            AllianceSearch::ByName("Rose".to_string())
        );
        assert_eq!(
            AllianceSearch::try_from(query(Some("Rose"), Some("913"))).unwrap(),
            AllianceSearch::ById(913)
        );
    }

    #[test]
    fn test_parse_search_errors() {
        assert!(matches!(
            AllianceSearch::try_from(query(None, None)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            AllianceSearch::try_from(query(Some(""), Some(" "))),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            AllianceSearch::try_from(query(None, Some("abc"))),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            AllianceSearch::try_from(query(None, Some("0"))),
            Err(ApiError::Validation(_))
        ));
    }
}
