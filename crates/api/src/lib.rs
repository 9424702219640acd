//! Alliance Portal API Library
//!
//! HTTP server for the alliance member portal: subdomain routing onto
//! whitelisted alliances, session-derived access control, and JSON views
//! backed by Postgres and the Politics and War API.

pub mod auth;
pub mod config;
pub mod error;
pub mod pnw;
pub mod routes;
pub mod routing;
pub mod settings;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routing::{ResolvedAlliance, SubdomainRouter, WhitelistLookup};
pub use state::AppState;
