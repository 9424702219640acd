//! Per-request session context
//!
//! Handlers receive the signed-in user as an explicit [`SessionContext`]
//! argument (or [`AdminContext`] for admin-only routes). The context is built
//! from the session token on every request: the token proves the Discord
//! identity, the `users` row supplies the linked-key state, and the admin flag
//! comes from the configured allowlist.

use alliance_portal_shared::User;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::session::SessionClaims;
use crate::{error::ApiError, state::AppState};

/// The signed-in user and what they are allowed to do
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub discord_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub is_admin: bool,
    pub has_api_key: bool,
    pub nation_id: Option<i32>,
}

impl SessionContext {
    pub fn new(user: &User, is_admin: bool) -> Self {
        Self {
            user_id: user.id,
            discord_id: user.discord_id.clone(),
            username: user.discord_username.clone(),
            avatar: user.discord_avatar.clone(),
            is_admin,
            has_api_key: user.has_api_key(),
            nation_id: user.pnw_nation_id,
        }
    }

    /// Narrow to an admin context, or fail with `403`
    pub fn require_admin(self) -> Result<AdminContext, ApiError> {
        if self.is_admin {
            Ok(AdminContext(self))
        } else {
            tracing::warn!(discord_id = %self.discord_id, "Non-admin attempted admin access");
            Err(ApiError::Forbidden)
        }
    }
}

/// Session context of a user on the admin allowlist
#[derive(Debug, Clone)]
pub struct AdminContext(pub SessionContext);

impl std::ops::Deref for AdminContext {
    type Target = SessionContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&parts.headers, &jar, &state.config.session_cookie_name)
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.sessions.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            ApiError::InvalidSession
        })?;

        let user = sync_user(&state.pool, &claims).await?;
        Ok(SessionContext::new(&user, state.config.is_admin(&claims.sub)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        SessionContext::from_request_parts(parts, state)
            .await?
            .require_admin()
    }
}

/// Find the session token in the `Authorization` header or the session cookie
///
/// Quoted cookie values are unquoted.
pub fn session_token(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    jar.get(cookie_name)
        .map(|cookie| cookie.value_trimmed())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Load the user behind a session, creating the row on first sight and
/// refreshing the Discord profile fields when they changed
async fn sync_user(pool: &PgPool, claims: &SessionClaims) -> Result<User, ApiError> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE discord_id = $1")
        .bind(&claims.sub)
        .fetch_optional(pool)
        .await?;

    match existing {
        Some(user)
            if user.discord_username == claims.username && user.discord_avatar == claims.avatar =>
        {
            Ok(user)
        }
        _ => {
            let user: User = sqlx::query_as(
                r#"
                INSERT INTO users (discord_id, discord_username, discord_avatar)
                VALUES ($1, $2, $3)
                ON CONFLICT (discord_id) DO UPDATE
                    SET discord_username = EXCLUDED.discord_username,
                        discord_avatar = EXCLUDED.discord_avatar,
                        updated_at = NOW()
                RETURNING *
                "#,
            )
            .bind(&claims.sub)
            .bind(&claims.username)
            .bind(&claims.avatar)
            .fetch_one(pool)
            .await?;

            tracing::info!(user_id = %user.id, discord_id = %user.discord_id, "Synced user from session");
            Ok(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use time::OffsetDateTime;

    fn user(api_key: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            discord_id: "42".to_string(),
            discord_username: "wile".to_string(),
            discord_avatar: None,
            pnw_api_key: api_key.map(str::to_string),
            pnw_nation_id: api_key.map(|_| 501),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_context_flags() {
        let ctx = SessionContext::new(&user(Some("key")), false);
        assert!(ctx.has_api_key);
        assert_eq!(ctx.nation_id, Some(501));
        assert!(!ctx.is_admin);

        let ctx = SessionContext::new(&user(None), true);
        assert!(!ctx.has_api_key);
        assert!(ctx.is_admin);
    }

    #[test]
    fn test_require_admin() {
        let ctx = SessionContext::new(&user(None), false);
        assert!(matches!(ctx.require_admin(), Err(ApiError::Forbidden)));

        let ctx = SessionContext::new(&user(None), true);
        let admin = ctx.require_admin().unwrap();
        assert_eq!(admin.username, "wile");
    }

    fn token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
        session_token(headers, &CookieJar::from_headers(headers), cookie_name)
    }

    #[test]
    fn test_session_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("portal_session=cookie-token"));
        assert_eq!(token(&headers, "portal_session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; portal_session=abc.def.ghi; other=1"),
        );
        assert_eq!(token(&headers, "portal_session").as_deref(), Some("abc.def.ghi"));
        assert_eq!(token(&headers, "missing"), None);
    }

    #[test]
    fn test_session_token_from_quoted_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("portal_session=\"abc.def.ghi\""));
        assert_eq!(token(&headers, "portal_session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_token_across_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("portal_session=abc.def.ghi"));
        assert_eq!(token(&headers, "portal_session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_token_absent_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(token(&headers, "portal_session"), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("portal_session="));
        assert_eq!(token(&headers, "portal_session"), None);
    }
}
