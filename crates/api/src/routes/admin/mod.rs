//! Admin routes
//!
//! Every handler takes an [`AdminContext`](crate::auth::AdminContext), so
//! non-admins are rejected with `403` before any work is done.
//!
//! - `alliances`: whitelist listing, adding (or reactivating) and removal
//! - `settings`: recognized runtime settings
//! - `search`: alliance search against the game API
//! - `shared`: helpers used across the admin modules

pub mod alliances;
pub mod search;
pub mod settings;
pub mod shared;
