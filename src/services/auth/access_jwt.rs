use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use std::sync::Arc;

use crate::services::auth::claims::ClaimSet;
use crate::services::auth::signing_key::SigningKey;

/// Why a credential was rejected.
///
/// Callers only ever see a generic 401; the variant is for logs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("signing key unavailable")]
    KeyUnavailable,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("token expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Seam between the request filter and the token verification scheme.
pub trait CredentialValidator: Send + Sync + std::fmt::Debug {
    /// Validate a raw token (the `Bearer ` prefix already stripped).
    fn validate(&self, token: &str) -> Result<ClaimSet, ValidationError>;
}

/// HMAC (HS256/384/512) JWT verifier.
///
/// Holds a shared, read-only [`SigningKey`]; cloning is cheap.
#[derive(Clone, Debug)]
pub struct JwtValidator {
    key: Arc<SigningKey>,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(key: Arc<SigningKey>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // `exp` must be present, but it is compared below against an explicit clock so
        // that a token expiring exactly "now" is already rejected.
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self { key, validation }
    }

    /// Validate against an explicit "now" (seconds since epoch).
    ///
    /// Order: envelope parse, signature, expiration.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<ClaimSet, ValidationError> {
        let decoding_key = self
            .key
            .decoding_key()
            .ok_or(ValidationError::KeyUnavailable)?;

        if token.trim().is_empty() {
            return Err(ValidationError::Malformed("empty token".to_string()));
        }

        let data = jsonwebtoken::decode::<ClaimSet>(token, decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.exp <= now {
            return Err(ValidationError::Expired {
                exp: claims.exp,
                now,
            });
        }

        Ok(claims)
    }
}

impl CredentialValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<ClaimSet, ValidationError> {
        self.validate_at(token, chrono::Utc::now().timestamp())
    }
}
