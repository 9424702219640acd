//! Alliance Portal Shared Types and Utilities
//!
//! Row types, slug derivation, and database helpers shared by the portal crates.

pub mod db;
pub mod slug;
pub mod types;

pub use db::*;
pub use slug::{is_valid_slug, slug_from_name};
pub use types::*;
