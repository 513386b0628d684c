// security/src/session.rs
//
// The session is a signed token holding nothing but the numeric user
// id. Role and name are re-resolved from the identity store on every
// guarded request, so a role change takes effect immediately instead of
// living on in a stale session.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

pub const SESSION_COOKIE: &str = "session";

/// Claims for the session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (numeric user id)
    pub iat: u64,    // Issued at
    pub exp: u64,    // Expiration time
}

#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        SessionSigner {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    /// Issues a session token for the given user id.
    pub fn issue(&self, user_id: u64) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::InternalError(format!("System time error: {}", e)))?
            .as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("Failed to encode session token: {}", e)))
    }

    /// Decodes and validates a session token, returning the user id it
    /// was issued for. Any tampering, expiry or malformed subject yields
    /// `None`; callers treat that as an absent session.
    pub fn verify(&self, token: &str) -> Option<u64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        data.claims.sub.parse().ok()
    }

    /// `Set-Cookie` value establishing the session.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, self.ttl_seconds
        )
    }
}

/// `Set-Cookie` value clearing all session state.
pub fn clearing_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Pulls the session token out of a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .filter(|token| !token.is_empty())
}
