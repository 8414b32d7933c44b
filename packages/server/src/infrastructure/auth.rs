//! Credential verification for the WebSocket handshake.
//!
//! Token *issuance* belongs to the portal's auth service and is out of scope
//! here; this module only verifies the bearer token handed over during the
//! handshake and extracts the identity the rest of the subsystem trusts.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CohortId, Identity, Role, UserId};

/// Maximum accepted display-name length in claims.
const MAX_NAME_LEN: usize = 100;

/// Authentication errors surfaced during the handshake.
///
/// All of them refuse the connection before any registry state is created.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was attached to the handshake
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, expiry or structural validation failed
    #[error("invalid or expired token")]
    InvalidToken,

    /// The token verified but its claims do not form a usable identity
    #[error("malformed token claims: {0}")]
    MalformedClaims(String),
}

/// JWT claims minted by the portal's auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: numeric user id, as a string per JWT convention
    pub sub: String,
    /// `student` or `mentor`
    pub role: String,
    /// Display name
    pub name: String,
    /// Cohort the user belongs to, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<u64>,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

/// HS256 token verifier shared by all handshakes.
pub struct TokenVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for the given shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a bearer token and extract the identity it asserts.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        let user_id = claims
            .sub
            .parse::<u64>()
            .ok()
            .and_then(|id| UserId::new(id).ok())
            .ok_or_else(|| AuthError::MalformedClaims(format!("sub '{}'", claims.sub)))?;

        let role = Role::parse(&claims.role)
            .map_err(|_| AuthError::MalformedClaims(format!("role '{}'", claims.role)))?;

        if claims.name.len() > MAX_NAME_LEN {
            return Err(AuthError::MalformedClaims(format!(
                "name length {}",
                claims.name.len()
            )));
        }

        let cohort = match claims.cohort_id {
            Some(id) => Some(
                CohortId::new(id)
                    .map_err(|_| AuthError::MalformedClaims(format!("cohort_id {id}")))?,
            ),
            None => None,
        };

        Ok(Identity {
            user_id,
            role,
            name: claims.name,
            cohort,
        })
    }
}

/// Mint an HS256 token for the given claims.
///
/// The real portal mints tokens in its auth service; this helper exists for
/// tests and local tooling only.
pub fn mint_token(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}
