/// Factory: build the credential validator from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtValidator, SigningKey};

/// Decode the signing key once and share it with the validator.
///
/// A missing or malformed key does not abort startup: the validator is built over an
/// unavailable key and rejects every credential.
pub fn build_validator(config: &Config) -> Arc<JwtValidator> {
    let key = match config.jwt_secret_key.as_deref().map(SigningKey::from_base64) {
        Some(Ok(key)) => key,
        Some(Err(err)) => {
            tracing::error!(error = %err, "JWT_SECRET_KEY rejected; all bearer credentials will be refused");
            SigningKey::unavailable()
        }
        None => {
            tracing::error!("JWT_SECRET_KEY not set; all bearer credentials will be refused");
            SigningKey::unavailable()
        }
    };

    Arc::new(JwtValidator::new(Arc::new(key)))
}
