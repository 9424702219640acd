//! Hostname-based routing
//!
//! Maps alliance subdomains onto internal `/alliance/<slug>` paths using the
//! whitelist of active alliances.

pub mod host;
pub mod lookup;
pub mod subdomain;

pub use host::{alliance_url, is_passthrough_path, HostName, NOT_FOUND_PATH, RESERVED_LABELS};
pub use lookup::{LookupError, PgWhitelistLookup, WhitelistLookup};
pub use subdomain::{route_by_host, ResolvedAlliance, RoutingDecision, SubdomainRouter};
