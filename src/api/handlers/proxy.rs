/*
 * Responsibility
 * - Route Dispatch: pick the backend by path prefix and forward the (already authenticated) request
 * - Copy method / path / query / body / end-to-end headers upstream, stream the answer back
 * - Tag every dispatched response with X-Gateway-Route
 */
use std::error::Error;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    response::{IntoResponse, Response},
};

use http_body_util::LengthLimitError;

use crate::error::AppError;
use crate::services::auth::Identity;
use crate::services::route_table::Route;
use crate::state::AppState;

pub const GATEWAY_ROUTE_HEADER: HeaderName = HeaderName::from_static("x-gateway-route");

// RFC 9110 §7.6.1 connection-specific fields; never forwarded in either direction.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub async fn forward(State(state): State<AppState>, req: Request<Body>) -> Response {
    let Some(route) = state.routes.resolve(req.uri().path()).cloned() else {
        tracing::debug!(path = %req.uri().path(), "no route matches");
        return AppError::NotFound.into_response();
    };

    let res = match dispatch(&state.http, &route, req).await {
        Ok(res) => res,
        Err(err) => err.into_response(),
    };
    tag_route(res, &route)
}

async fn dispatch(
    client: &reqwest::Client,
    route: &Route,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let url = route.upstream_url(&parts.uri);

    // Buffered so an over-limit body is refused before the backend is contacted.
    // The transport layer bounds its size.
    let body = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        if exceeds_body_limit(&e) {
            tracing::warn!(route = %route.id, "request body over limit");
            AppError::PayloadTooLarge
        } else {
            tracing::warn!(route = %route.id, error = %e, "failed to read request body");
            AppError::InvalidRequest("unreadable request body".to_string())
        }
    })?;

    tracing::info!(
        route = %route.id,
        method = %parts.method,
        %url,
        user_id = ?parts.extensions.get::<Identity>().map(|i| i.user_id),
        "forwarding request"
    );

    let upstream = client
        .request(parts.method, url)
        .headers(end_to_end(&parts.headers, &[header::HOST, header::CONTENT_LENGTH]))
        .body(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(route = %route.id, error = %e, "upstream request failed");
            AppError::BadGateway
        })?;

    let status = upstream.status();
    let headers = end_to_end(upstream.headers(), &[]);

    // Streamed through as it arrives; a mid-body upstream failure aborts the response.
    let mut res = Response::new(Body::from_stream(upstream.bytes_stream()));
    *res.status_mut() = status;
    *res.headers_mut() = headers;
    Ok(res)
}

fn exceeds_body_limit(err: &axum::Error) -> bool {
    let mut cause: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(e) = cause {
        if e.is::<LengthLimitError>() {
            return true;
        }
        cause = e.source();
    }
    false
}

/// Copy of `headers` without hop-by-hop fields, the fields listed in `Connection`,
/// and `also_drop`.
fn end_to_end(headers: &HeaderMap, also_drop: &[HeaderName]) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let drop = HOP_BY_HOP.contains(name)
            || also_drop.contains(name)
            || listed.iter().any(|t| t == name.as_str());
        if !drop {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

fn tag_route(mut res: Response, route: &Route) -> Response {
    if let Ok(value) = HeaderValue::from_str(&route.id) {
        res.headers_mut().insert(GATEWAY_ROUTE_HEADER, value);
    }
    res
}
