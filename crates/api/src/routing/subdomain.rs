//! Subdomain routing middleware
//!
//! Runs before the router. Requests to `<slug>.<base domain>` are rewritten to
//! `/alliance/<slug><path>` when the slug belongs to an active whitelisted
//! alliance, and redirected to the main site's "not found" page otherwise.
//! Main-site hosts, reserved labels and passthrough paths are left alone.

use std::sync::Arc;

use alliance_portal_shared::{is_valid_slug, AllianceSummary};
use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::host::{alliance_path, is_passthrough_path, is_reserved_label, HostName};
use super::lookup::WhitelistLookup;

/// Alliance a subdomain request was resolved to, stored in request extensions
#[derive(Debug, Clone)]
pub struct ResolvedAlliance(pub AllianceSummary);

/// What to do with an incoming request
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    /// Leave the request untouched
    PassThrough,
    /// Serve the request from an internal alliance path
    Rewrite {
        alliance: AllianceSummary,
        path_and_query: String,
    },
    /// Send the client elsewhere with a temporary redirect
    Redirect(String),
}

/// Decides how requests are routed based on their host
#[derive(Clone)]
pub struct SubdomainRouter {
    lookup: Arc<dyn WhitelistLookup>,
}

impl SubdomainRouter {
    pub fn new(lookup: Arc<dyn WhitelistLookup>) -> Self {
        Self { lookup }
    }

    /// Route a request for `host` and `uri`
    ///
    /// Lookup failures redirect to the "not found" page rather than serving
    /// the main site on an alliance host.
    pub async fn decide(&self, host: &str, uri: &Uri) -> RoutingDecision {
        let path = uri.path();
        if is_passthrough_path(path) {
            return RoutingDecision::PassThrough;
        }

        let host = HostName::parse(host);
        let Some(label) = host.subdomain_label() else {
            return RoutingDecision::PassThrough;
        };
        if is_reserved_label(label) {
            return RoutingDecision::PassThrough;
        }
        if !is_valid_slug(label) {
            tracing::debug!(subdomain = %label, "Subdomain is not a valid slug");
            return RoutingDecision::Redirect(host.not_found_url());
        }

        match self.lookup.find_active(label).await {
            Ok(Some(alliance)) => {
                let mut path_and_query = alliance_path(label, path);
                if let Some(query) = uri.query() {
                    path_and_query.push('?');
                    path_and_query.push_str(query);
                }
                tracing::debug!(
                    subdomain = %label,
                    alliance_id = alliance.alliance_id,
                    rewritten = %path_and_query,
                    "Routing alliance subdomain"
                );
                RoutingDecision::Rewrite { alliance, path_and_query }
            }
            Ok(None) => {
                tracing::debug!(subdomain = %label, "Unknown or inactive alliance subdomain");
                RoutingDecision::Redirect(host.not_found_url())
            }
            Err(e) => {
                tracing::warn!(subdomain = %label, error = %e, "Whitelist lookup failed");
                RoutingDecision::Redirect(host.not_found_url())
            }
        }
    }
}

/// Host of a request: the `Host` header, or the URI authority for HTTP/2
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
}

/// Replace the path and query of `uri`, keeping scheme and authority
fn with_path_and_query(uri: &Uri, path_and_query: &str) -> Option<Uri> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

/// Middleware applying [`SubdomainRouter`] decisions ahead of routing
pub async fn route_by_host(
    State(router): State<SubdomainRouter>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(host) = request_host(&request) else {
        return next.run(request).await;
    };

    match router.decide(&host, request.uri()).await {
        RoutingDecision::PassThrough => next.run(request).await,
        RoutingDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
        RoutingDecision::Rewrite { alliance, path_and_query } => {
            match with_path_and_query(request.uri(), &path_and_query) {
                Some(uri) => {
                    *request.uri_mut() = uri;
                    request.extensions_mut().insert(ResolvedAlliance(alliance));
                    next.run(request).await
                }
                None => {
                    tracing::warn!(rewritten = %path_and_query, "Rewritten alliance path is not a valid URI");
                    Redirect::temporary(&HostName::parse(&host).not_found_url()).into_response()
                }
            }
        }
    }
}
