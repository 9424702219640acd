//! HTTP routes

pub mod admin;
pub mod alliances;
pub mod auth;
pub mod health;
pub mod me;
pub mod setup;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower::Layer;
use tower_http::trace::TraceLayer;

use crate::{routing::route_by_host, state::AppState};

/// Success envelope shared by JSON endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data, message: None }
    }

    pub fn with_message(data: T, message: &'static str) -> Self {
        Self { success: true, data, message: Some(message) }
    }
}

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Pages reached directly or through subdomain rewriting
    let page_routes = Router::new()
        .route("/alliance/:slug", get(alliances::landing))
        .route("/subdomain-not-found", get(alliances::subdomain_not_found));

    // Public API routes
    let public_api_routes = Router::new()
        .route("/alliances/validate-subdomain", get(alliances::validate_subdomain));

    // Session routes (SessionContext / AdminContext extractors enforce auth)
    let session_api_routes = Router::new()
        .route("/me", get(me::dashboard))
        .route("/setup/validate-api-key", post(setup::validate_api_key))
        .route("/debug/nation", get(me::debug_nation))
        // Admin routes
        .route("/admin/settings", get(admin::settings::list_settings).put(admin::settings::update_setting))
        .route("/admin/alliances", get(admin::alliances::list_alliances).post(admin::alliances::add_alliance))
        .route("/admin/alliances/:alliance_id", delete(admin::alliances::remove_alliance))
        .route("/admin/search-alliances", get(admin::search::search_alliances));

    let auth_routes = Router::new().route("/signout", post(auth::signout));

    Router::new()
        .merge(health_routes)
        .merge(page_routes)
        .nest("/api", public_api_routes.merge(session_api_routes))
        .nest("/auth", auth_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Full application: subdomain routing ahead of route matching, plus tracing
pub fn app(state: AppState) -> Router {
    let subdomains = state.subdomain_router();
    let routes = create_router(state);

    // The host rewrite has to happen before the inner router matches a path
    let routed = middleware::from_fn_with_state(subdomains, route_by_host).layer(routes);

    Router::new()
        .fallback_service(routed)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{DiscordIdentity, SessionManager},
        routing::lookup::testing::StaticWhitelist,
        state::testing,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let whitelist = Arc::new(StaticWhitelist::with(&[("acme", 1234, "Acme Corp", true)]));
        app(testing::state("http://127.0.0.1:1/graphql", whitelist))
    }

    async fn get_with(app: Router, host: &str, uri: &str, bearer: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri).header(header::HOST, host);
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = get_with(test_app(), "example.com", "/health/live", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validate_subdomain_through_app() {
        let response =
            get_with(test_app(), "example.com", "/api/alliances/validate-subdomain?slug=acme", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["alliance_id"], 1234);
        assert_eq!(body["data"]["name"], "Acme Corp");
    }

    #[tokio::test]
    async fn test_unknown_subdomain_redirects_through_app() {
        let response = get_with(test_app(), "ghost.example.com", "/info", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/subdomain-not-found"
        );
    }

    #[tokio::test]
    async fn test_api_paths_on_subdomains_are_not_rewritten() {
        let response =
            get_with(test_app(), "ghost.example.com", "/api/alliances/validate-subdomain?slug=nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_session_routes_require_token() {
        let response = get_with(test_app(), "example.com", "/api/me", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = get_with(test_app(), "example.com", "/api/admin/settings", Some("garbage")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_SESSION");
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let foreign = SessionManager::new("some-other-secret-that-is-32-chars-long", 1)
            .issue(&DiscordIdentity {
                discord_id: "1".to_string(),
                username: "mallory".to_string(),
                avatar: None,
            })
            .unwrap();
        let response = get_with(test_app(), "example.com", "/api/admin/alliances", Some(&foreign)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_not_found_page_on_main_domain() {
        let whitelist = Arc::new(StaticWhitelist::default());
        let state = testing::state("http://127.0.0.1:1/graphql", whitelist);
        let router = create_router(state.clone());
        let layered = middleware::from_fn_with_state(state.subdomain_router(), route_by_host).layer(router);

        let response = layered
            .oneshot(
                Request::builder()
                    .uri("/subdomain-not-found")
                    .header(header::HOST, "example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
