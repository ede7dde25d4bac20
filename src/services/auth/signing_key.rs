//! HMAC signing key shared by every validator.
//!
//! The key arrives as Base64 text from configuration and is decoded exactly once at startup.
//! A key that is missing or cannot be decoded is kept as "unavailable" so the validator can
//! reject every credential instead of refusing to boot.

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use jsonwebtoken::DecodingKey;

// Issuers commonly emit secrets with non-canonical trailing bits (e.g. "abc123=="), and the
// JVM decoder they are generated with accepts them. Mirror that leniency.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SigningKeyError {
    #[error("signing key is not configured")]
    Missing,
    #[error("signing key is not valid base64")]
    InvalidBase64,
    #[error("signing key decodes to zero bytes")]
    Empty,
}

/// Raw HMAC secret bytes from its Base64 text form.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, SigningKeyError> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(SigningKeyError::Missing);
    }

    let bytes = LENIENT_STANDARD
        .decode(secret)
        .map_err(|_| SigningKeyError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(SigningKeyError::Empty);
    }

    Ok(bytes)
}

#[derive(Clone)]
pub struct SigningKey {
    decoding_key: Option<DecodingKey>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("SigningKey")
            .field("available", &self.is_available())
            .finish()
    }
}

impl SigningKey {
    /// Decode a Base64 HMAC secret.
    pub fn from_base64(secret: &str) -> Result<Self, SigningKeyError> {
        decode_secret(secret).map(|bytes| Self::from_bytes(&bytes))
    }

    pub fn from_bytes(secret: &[u8]) -> Self {
        Self {
            decoding_key: Some(DecodingKey::from_secret(secret)),
        }
    }

    /// A key that rejects everything (fail closed).
    pub fn unavailable() -> Self {
        Self { decoding_key: None }
    }

    pub fn is_available(&self) -> bool {
        self.decoding_key.is_some()
    }

    pub(crate) fn decoding_key(&self) -> Option<&DecodingKey> {
        self.decoding_key.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lenient_base64() {
        let key = SigningKey::from_base64("abc123==").unwrap();
        assert!(key.is_available());
    }

    #[test]
    fn decodes_to_expected_bytes() {
        assert_eq!(decode_secret("c2VjcmV0").unwrap(), b"secret".to_vec());
        assert_eq!(decode_secret("abc123==").unwrap().len(), 4);
    }

    #[test]
    fn rejects_blank_secret() {
        assert_eq!(
            SigningKey::from_base64("   ").unwrap_err(),
            SigningKeyError::Missing
        );
    }

    #[test]
    fn rejects_non_base64_secret() {
        assert_eq!(
            SigningKey::from_base64("not base64 at all!").unwrap_err(),
            SigningKeyError::InvalidBase64
        );
    }

    #[test]
    fn debug_does_not_print_material() {
        let key = SigningKey::from_bytes(b"super-secret");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("available: true"));
    }
}
