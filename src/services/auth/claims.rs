/*
 * Responsibility
 * - The verified payload of a bearer credential (ClaimSet)
 * - Projection of the identity fields the gateway propagates (employeeId / userId / role)
 *
 * Accessors never re-validate: a ClaimSet only exists once the validator accepted the token.
 */
use serde::{Deserialize, Deserializer, de};
use serde_json::{Map, Number, Value};

pub const EMPLOYEE_ID_CLAIM: &str = "employeeId";
pub const USER_ID_CLAIM: &str = "userId";
pub const ROLE_CLAIM: &str = "role";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("required claim '{0}' is missing or not an integer")]
    MissingRequired(&'static str),
    #[error("claim '{0}' cannot be carried in a header")]
    NotHeaderSafe(&'static str),
}

/// Decoded and verified token payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClaimSet {
    /// Expiration (seconds since epoch). Fractional values keep their whole seconds.
    #[serde(deserialize_with = "whole_seconds")]
    pub exp: i64,
    #[serde(flatten)]
    claims: Map<String, Value>,
}

fn whole_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        })
        .ok_or_else(|| de::Error::custom(format!("exp {} is not a usable timestamp", n)))
}

/// Identity fields projected out of a [`ClaimSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub employee_id: Option<String>,
    pub user_id: i64,
    pub role: Option<String>,
}

impl ClaimSet {
    pub fn employee_id(&self) -> Option<&str> {
        self.string_claim(EMPLOYEE_ID_CLAIM)
    }

    /// Immutable numeric user id. Issuers occasionally serialize it as a string.
    pub fn user_id(&self) -> Option<i64> {
        match self.claims.get(USER_ID_CLAIM)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.string_claim(ROLE_CLAIM)
    }

    pub fn identity(&self) -> Result<Identity, ClaimError> {
        let user_id = self
            .user_id()
            .ok_or(ClaimError::MissingRequired(USER_ID_CLAIM))?;

        Ok(Identity {
            employee_id: self.employee_id().map(str::to_owned),
            user_id,
            role: self.role().map(str::to_owned),
        })
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}
