//! Token minting helpers shared by unit tests.
use std::sync::Arc;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;

use crate::services::auth::signing_key::decode_secret;
use crate::services::auth::{JwtValidator, SigningKey};

pub const SECRET_B64: &str = "abc123==";

pub fn validator() -> JwtValidator {
    let key = SigningKey::from_base64(SECRET_B64).unwrap();
    JwtValidator::new(Arc::new(key))
}

pub fn mint(payload: &Value) -> String {
    mint_with(&decode_secret(SECRET_B64).unwrap(), payload)
}

pub fn mint_with(secret: &[u8], payload: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        payload,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

/// One hour from now.
pub fn future_exp() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}
