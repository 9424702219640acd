//! Host header parsing for subdomain routing
//!
//! Development hosts live under `localhost` (e.g. `acme.localhost:3000`);
//! production hosts are a subdomain label on a two-label base domain
//! (e.g. `acme.example.com`).

use std::net::IpAddr;

/// Labels that always mean "main site", whatever the whitelist says
pub const RESERVED_LABELS: &[&str] = &["www"];

/// Path prefixes that never take part in subdomain routing
pub const PASSTHROUGH_PREFIXES: &[&str] = &["/api", "/auth", "/static", "/assets", "/health"];

/// Internal prefix alliance pages are served under
pub const ALLIANCE_PATH_PREFIX: &str = "/alliance";

/// Page subdomain requests for unknown alliances are sent to
pub const NOT_FOUND_PATH: &str = "/subdomain-not-found";

/// Base domain used for local development
const DEV_BASE_DOMAIN: &str = "localhost";

/// A host header split into a normalized hostname and optional port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostName {
    /// Lowercased hostname without port or trailing dot
    pub name: String,
    pub port: Option<String>,
}

impl HostName {
    /// Parse a host header value
    pub fn parse(host: &str) -> Self {
        let host = host.trim();

        let (name, port) = if let Some(rest) = host.strip_prefix('[') {
            // Bracketed IPv6 literal, e.g. "[::1]:3000"
            match rest.split_once(']') {
                Some((addr, tail)) => (addr, tail.strip_prefix(':')),
                None => (rest, None),
            }
        } else {
            match host.rsplit_once(':') {
                Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                    (name, Some(port))
                }
                _ => (host, None),
            }
        };

        Self {
            name: name.trim_end_matches('.').to_lowercase(),
            port: port.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    fn labels(&self) -> Vec<&str> {
        self.name.split('.').collect()
    }

    fn is_ip_literal(&self) -> bool {
        self.name.parse::<IpAddr>().is_ok()
    }

    /// Whether this is a local development host under `localhost`
    pub fn is_development(&self) -> bool {
        self.name == DEV_BASE_DOMAIN || self.name.ends_with(".localhost")
    }

    /// Candidate subdomain label, if the host has one
    ///
    /// Development hosts need more than one label; production hosts need at
    /// least three. IP literals never carry a subdomain.
    pub fn subdomain_label(&self) -> Option<&str> {
        if self.name.is_empty() || self.is_ip_literal() {
            return None;
        }

        let labels = self.labels();
        let required = if self.is_development() { 2 } else { 3 };
        if labels.len() < required {
            return None;
        }

        labels.first().copied().filter(|label| !label.is_empty())
    }

    /// The main-site host (subdomain stripped), keeping any port
    pub fn main_domain(&self) -> String {
        let base = if self.is_development() {
            DEV_BASE_DOMAIN.to_string()
        } else {
            let labels = self.labels();
            if labels.len() >= 2 {
                labels[labels.len() - 2..].join(".")
            } else {
                self.name.clone()
            }
        };

        match &self.port {
            Some(port) => format!("{base}:{port}"),
            None => base,
        }
    }

    /// `http` for development hosts, `https` otherwise
    pub fn scheme(&self) -> &'static str {
        if self.is_development() {
            "http"
        } else {
            "https"
        }
    }

    /// Absolute URL of the "subdomain not found" page on the main site
    pub fn not_found_url(&self) -> String {
        format!("{}://{}{}", self.scheme(), self.main_domain(), NOT_FOUND_PATH)
    }
}

/// Whether a label is reserved for the main site
pub fn is_reserved_label(label: &str) -> bool {
    RESERVED_LABELS.contains(&label)
}

/// Whether a request path bypasses subdomain routing
///
/// Prefixes match whole path segments, so `/api/x` passes through but
/// `/apiary` does not. Any path whose last segment has a file extension
/// passes through as a static asset.
pub fn is_passthrough_path(path: &str) -> bool {
    let prefixed = PASSTHROUGH_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    });

    prefixed || path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// Internal path an alliance subdomain request is served from
pub fn alliance_path(label: &str, path: &str) -> String {
    if path.is_empty() || path == "/" {
        format!("{ALLIANCE_PATH_PREFIX}/{label}")
    } else {
        format!("{ALLIANCE_PATH_PREFIX}/{label}{path}")
    }
}

/// Public URL of an alliance's subdomain landing page
pub fn alliance_url(base_domain: &str, slug: &str) -> String {
    let base = HostName::parse(base_domain);
    let host = match &base.port {
        Some(port) => format!("{slug}.{}:{port}", base.name),
        None => format!("{slug}.{}", base.name),
    };
    format!("{}://{host}", base.scheme())
}
