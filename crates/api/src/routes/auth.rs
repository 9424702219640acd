//! Session routes

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use time::Duration;

use crate::{routing::HostName, state::AppState};

/// Cookie that expires the session cookie when added to a response
///
/// Production sessions are shared across alliance subdomains, so the cookie
/// is scoped to the base domain there.
pub fn clear_session_cookie(cookie_name: &str, base_domain: &str) -> Cookie<'static> {
    let base = HostName::parse(base_domain);
    let mut cookie = Cookie::build((cookie_name.to_string(), ""))
        .path("/")
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax);
    if !base.is_development() {
        cookie = cookie.secure(true).domain(base.name);
    }
    cookie.build()
}

/// Sign out by clearing the session cookie
pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let cookie = clear_session_cookie(&state.config.session_cookie_name, &state.config.base_domain);
    (jar.add(cookie), Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{routing::lookup::testing::StaticWhitelist, state::testing};
    use axum::{http::header, response::IntoResponse};
    use std::sync::Arc;

    #[test]
    fn test_clear_cookie_development() {
        let cookie = clear_session_cookie("portal_session", "localhost:3000");
        assert_eq!(cookie.name(), "portal_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn test_clear_cookie_production() {
        let cookie = clear_session_cookie("portal_session", "example.com");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.domain(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_signout_sets_cookie_without_existing_session() {
        let state = testing::state("http://127.0.0.1:1/graphql", Arc::new(StaticWhitelist::default()));
        let response = signout(State(state), CookieJar::new()).await.into_response();

        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let cookie = Cookie::parse(cookie.to_string()).unwrap();
        assert_eq!(cookie.name(), "portal_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.domain(), Some("example.com"));
    }
}
