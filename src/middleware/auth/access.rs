//! Bearer credential check → identity headers on the forwarded request.
//!
//! The decision itself is the pure function [`authenticate`]: it takes ownership of the inbound
//! request and either hands back the enriched request (`Forward`) or the reason for refusing it
//! (`Reject`). The axum middleware below only adapts that decision to the pipeline.
//!
//! Per request:
//! 1. excluded path → forward without a credential check (caller identity headers dropped)
//! 2. `Authorization: Bearer <token>` required
//! 3. token validated (signature + expiry)
//! 4. `employeeId` / `userId` projected out of the claims
//! 5. `X-Employee-Id` / `X-User-Id` overwritten with the verified values

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::ExclusionRules;
use crate::services::auth::{ClaimError, CredentialValidator, Identity, ValidationError};
use crate::state::AppState;

pub const EMPLOYEE_ID_HEADER: HeaderName = HeaderName::from_static("x-employee-id");
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingCredential,
    #[error("invalid credential: {0}")]
    InvalidCredential(#[source] ValidationError),
    #[error("signing key unavailable")]
    KeyUnavailable,
    #[error("incomplete identity: {0}")]
    IncompleteIdentity(#[source] ClaimError),
}

impl From<ValidationError> for AuthError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::KeyUnavailable => AuthError::KeyUnavailable,
            other => AuthError::InvalidCredential(other),
        }
    }
}

/// Terminal outcome of the filter for one request.
#[derive(Debug)]
pub enum Decision<B> {
    Forward(Request<B>),
    Reject(AuthError),
}

/// Decide whether `req` may be forwarded, enriching it with verified identity headers.
pub fn authenticate<B>(
    mut req: Request<B>,
    validator: &dyn CredentialValidator,
    exclusions: &ExclusionRules,
) -> Decision<B> {
    if exclusions.is_excluded(req.uri().path()) {
        // No credential check here, but identity headers still only come from the gateway.
        strip_identity_headers(req.headers_mut());
        return Decision::Forward(req);
    }

    let identity = match verify(req.headers(), validator) {
        Ok(identity) => identity,
        Err(err) => return Decision::Reject(err),
    };

    // `insert` replaces every caller-supplied value of the same name.
    let headers = req.headers_mut();
    match identity.employee_id.as_deref().map(HeaderValue::from_str) {
        Some(Ok(value)) => {
            headers.insert(EMPLOYEE_ID_HEADER, value);
        }
        Some(Err(_)) => {
            return Decision::Reject(AuthError::IncompleteIdentity(ClaimError::NotHeaderSafe(
                "employeeId",
            )));
        }
        None => {
            headers.remove(EMPLOYEE_ID_HEADER);
        }
    }
    headers.insert(USER_ID_HEADER, HeaderValue::from(identity.user_id));

    req.extensions_mut().insert(identity);
    Decision::Forward(req)
}

fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(EMPLOYEE_ID_HEADER);
    headers.remove(USER_ID_HEADER);
}

fn verify(headers: &HeaderMap, validator: &dyn CredentialValidator) -> Result<Identity, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    let claims = validator.validate(token)?;
    claims.identity().map_err(AuthError::IncompleteIdentity)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
}

/// Put the filter in front of everything the router serves (fallback included).
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    match authenticate(req, state.validator.as_ref(), &state.exclusions) {
        Decision::Forward(req) => {
            match req.extensions().get::<Identity>() {
                Some(identity) => tracing::debug!(
                    %method,
                    %path,
                    employee_id = ?identity.employee_id,
                    user_id = identity.user_id,
                    "credential accepted"
                ),
                None => tracing::debug!(%method, %path, "excluded path, credential check skipped"),
            }
            Ok(next.run(req).await)
        }
        Decision::Reject(err) => {
            tracing::warn!(%method, %path, error = %err, cause = ?err, "request rejected");
            Err(err.into())
        }
    }
}
