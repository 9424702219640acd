//! Session authentication for the portal

pub mod context;
pub mod session;

pub use context::{session_token, AdminContext, SessionContext};
pub use session::{DiscordIdentity, SessionClaims, SessionError, SessionManager};
