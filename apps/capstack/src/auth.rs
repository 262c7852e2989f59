//! # Bearer Tokens and Password Hashes
//!
//! Tokens have the form `base64url(claims).base64url(mac)`, where `mac` is a
//! blake3 keyed hash of the encoded claims under a key derived from the
//! configured secret. Signature comparison is constant time.
//!
//! Passwords are hashed with Argon2id under a random per-user salt and stored
//! as PHC strings. The hash does not depend on the token secret, so rotating
//! the secret invalidates tokens but not passwords.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use capstack_core::UserId;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

const TOKEN_CONTEXT: &str = "capstack 2026-01 bearer token mac";

/// Authentication failures. Messages are sent to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// Hashing failed. Never shown to clients.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// What a token asserts. Times are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies tokens.
#[derive(Clone)]
pub struct TokenSigner {
    mac_key: [u8; 32],
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_hours: u32) -> Self {
        Self {
            mac_key: blake3::derive_key(TOKEN_CONTEXT, secret.as_bytes()),
            ttl_secs: i64::from(ttl_hours) * 3600,
        }
    }

    fn mac(&self, payload: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.mac_key, payload.as_bytes())
    }

    /// Sign a token for `user`, valid from `now` for the configured TTL.
    pub fn issue(&self, user: UserId, email: &str, name: &str, now: i64) -> String {
        let claims = Claims {
            user_id: user,
            email: email.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        // Claims hold only strings and integers.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).as_bytes());
        format!("{payload}.{signature}")
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidFormat)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidFormat)?;

        let expected = self.mac(payload);
        if !bool::from(expected.as_bytes().as_slice().ct_eq(signature.as_slice())) {
            return Err(AuthError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidFormat)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::InvalidFormat)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Argon2id PHC string for `password` under a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// False for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc).is_ok_and(|hash| {
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    })
}

/// The token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::InvalidFormat)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }
    Ok(token)
}
