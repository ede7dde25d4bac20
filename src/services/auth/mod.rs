pub mod access_jwt;
pub mod claims;
pub mod factory;
pub mod signing_key;

#[cfg(test)]
pub(crate) mod test_support;

pub use access_jwt::{CredentialValidator, JwtValidator, ValidationError};
pub use claims::{ClaimError, Identity};
pub use factory::build_validator;
pub use signing_key::SigningKey;
