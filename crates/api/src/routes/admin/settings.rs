//! Admin settings routes

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    auth::AdminContext,
    error::{ApiError, ApiResult},
    routes::ApiResponse,
    settings::{self, setting_views, SettingKey, SettingView},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingRequest {
    pub setting_key: Option<String>,
    pub setting_value: Option<String>,
}

/// List every recognized setting, secrets masked
pub async fn list_settings(
    State(state): State<AppState>,
    _admin: AdminContext,
) -> ApiResult<Json<ApiResponse<Vec<SettingView>>>> {
    let rows = settings::load_rows(&state.pool).await?;
    Ok(Json(ApiResponse::ok(setting_views(&rows))))
}

/// Set or clear one recognized setting
pub async fn update_setting(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(req): Json<UpdateSettingRequest>,
) -> ApiResult<Json<ApiResponse<SettingView>>> {
    let key: SettingKey = req
        .setting_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Setting key is required".to_string()))?
        .parse()?;

    let row = settings::update(&state.pool, key, req.setting_value.as_deref(), admin.user_id).await?;

    Ok(Json(ApiResponse::with_message(
        SettingView::new(key, row.setting_value.as_deref(), Some(row.updated_at)),
        "Setting updated successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::SessionContext, routing::lookup::testing::StaticWhitelist, state::testing};
    use std::sync::Arc;
    use uuid::Uuid;

    fn admin() -> AdminContext {
        AdminContext(SessionContext {
            user_id: Uuid::new_v4(),
            discord_id: "1".to_string(),
            username: "root".to_string(),
            avatar: None,
            is_admin: true,
            has_api_key: false,
            nation_id: None,
        })
    }

    fn request(key: Option<&str>, value: Option<&str>) -> Json<UpdateSettingRequest> {
        Json(UpdateSettingRequest {
            setting_key: key.map(str::to_string),
            setting_value: value.map(str::to_string),
        })
    }

    fn state() -> AppState {
        testing::state("http://127.0.0.1:1/graphql", Arc::new(StaticWhitelist::default()))
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let result = update_setting(State(state()), admin(), request(None, Some("x"))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let result = update_setting(State(state()), admin(), request(Some("site_theme"), Some("dark"))).await;
        match result {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("site_theme")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_value_is_rejected_before_storage() {
        let result = update_setting(
            State(state()),
            admin(),
            request(Some("admin_contact_email"), Some("not-an-email")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let req: UpdateSettingRequest =
            serde_json::from_str(r#"{"settingKey":"discord_invite_url","settingValue":null}"#).unwrap();
        assert_eq!(req.setting_key.as_deref(), Some("discord_invite_url"));
        assert!(req.setting_value.is_none());
    }
}
