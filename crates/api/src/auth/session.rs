//! Signed session tokens
//!
//! Sessions are HS256 JWTs carrying the Discord identity of the signed-in
//! user. Authorization flags are not stored in the token; they are resolved
//! per request into a [`SessionContext`](super::SessionContext).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Claims carried by a portal session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (Discord user id)
    pub sub: String,
    /// Discord username at sign-in
    pub username: String,
    /// Discord avatar hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Discord identity a session is issued for
#[derive(Debug, Clone)]
pub struct DiscordIdentity {
    pub discord_id: String,
    pub username: String,
    pub avatar: Option<String>,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a session token for a Discord identity
    pub fn issue(&self, identity: &DiscordIdentity) -> Result<String, SessionError> {
        if identity.discord_id.trim().is_empty() {
            return Err(SessionError::Encoding("discord id is empty".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let exp = self
            .expiry_hours
            .checked_mul(3600)
            .map(Duration::seconds)
            .and_then(|lifetime| now.checked_add(lifetime))
            .ok_or_else(|| SessionError::Encoding("session expiry is out of range".to_string()))?;

        let claims = SessionClaims {
            sub: identity.discord_id.clone(),
            username: identity.username.clone(),
            avatar: identity.avatar.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encoding(e.to_string()))
    }

    /// Validate and decode a session token
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60; // 60 second clock skew tolerance

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => SessionError::Invalid,
                _ => SessionError::Validation(e.to_string()),
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session has expired")]
    Expired,
    #[error("Invalid session token")]
    Invalid,
    #[error("Session encoding failed: {0}")]
    Encoding(String),
    #[error("Session validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret-at-least-32-chars!";

    fn identity() -> DiscordIdentity {
        DiscordIdentity {
            discord_id: "80351110224678912".to_string(),
            username: "wile".to_string(),
            avatar: Some("a_1234".to_string()),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let sessions = SessionManager::new(SECRET, 24);
        let token = sessions.issue(&identity()).unwrap();

        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.sub, "80351110224678912");
        assert_eq!(claims.username, "wile");
        assert_eq!(claims.avatar.as_deref(), Some("a_1234"));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = SessionManager::new(SECRET, 24).issue(&identity()).unwrap();
        let other = SessionManager::new("another-secret-that-is-also-32-chars-long", 24);
        assert!(matches!(other.verify(&token), Err(SessionError::Invalid)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let sessions = SessionManager::new(SECRET, 24);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionClaims {
            sub: "1".to_string(),
            username: "old".to_string(),
            avatar: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(sessions.verify(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        for hours in [i64::MAX, i64::MAX / 3600] {
            let sessions = SessionManager::new(SECRET, hours);
            assert!(matches!(sessions.issue(&identity()), Err(SessionError::Encoding(_))));
        }
    }

    #[test]
    fn test_garbage_and_empty_identity() {
        let sessions = SessionManager::new(SECRET, 24);
        assert!(sessions.verify("not-a-token").is_err());

        let blank = DiscordIdentity {
            discord_id: "  ".to_string(),
            username: "x".to_string(),
            avatar: None,
        };
        assert!(sessions.issue(&blank).is_err());
    }
}
