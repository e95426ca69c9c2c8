/**
 * Connection Authentication
 *
 * This module verifies the bearer credential presented on every new
 * persistent connection and on every history request. The credential is a
 * JWT signed with a shared secret; on success it yields the caller's
 * identity, on failure the operation is rejected and never retried by the
 * server - the caller must re-authenticate with a fresh credential.
 */
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity carried inside a verified credential
///
/// Owned by the auth collaborator; immutable once issued into a
/// credential. This core only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id
    pub id: String,
    /// Display username, used as the message sender
    pub username: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Credential verification failure
///
/// Always fatal to the requesting operation. The display strings are the
/// exact messages surfaced to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was presented
    #[error("Authorization token required.")]
    MissingCredential,
    /// The credential failed signature or structural validation
    #[error("Invalid or expired token.")]
    InvalidCredential,
    /// The credential is past its expiry
    #[error("Invalid or expired token.")]
    ExpiredCredential,
}

impl AuthError {
    /// HTTP status for this failure: 401 for a missing credential,
    /// 403 for an invalid or expired one
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential | Self::ExpiredCredential => StatusCode::FORBIDDEN,
        }
    }
}

/// Verify and decode a credential
///
/// # Arguments
/// * `secret` - The shared signing secret
/// * `token` - The presented JWT
///
/// # Returns
/// The identity carried by the credential, or the reason it was rejected
pub fn verify_token(secret: &str, token: &str) -> Result<Identity, AuthError> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
        _ => AuthError::InvalidCredential,
    })?;

    Ok(Identity {
        id: data.claims.sub,
        username: data.claims.username,
    })
}

/// Extract and verify the bearer credential from request headers
///
/// An absent Authorization header is a missing credential (401); a header
/// without the `Bearer ` prefix, or one carrying a bad token, is an
/// invalid credential (403).
pub fn bearer_identity(secret: &str, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidCredential)?;

    verify_token(secret, token)
}

#[cfg(test)]
pub(crate) mod test_tokens {
    //! Token minting for tests. Issuance is owned by the auth collaborator
    //! in production; only tests create credentials here.
    use super::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn mint(secret: &str, user_id: &str, username: &str, ttl_secs: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + ttl_secs).max(0) as u64,
            iat: now.max(0) as u64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }
}
