/*
 * Responsibility
 * - Load Config -> build dependencies -> assemble the Router
 * - Apply middleware (CORS / transport / authentication)
 * - Start axum::serve() and stop on Ctrl-C
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{
    self,
    auth::ExclusionRules,
    http::HttpLimits,
};
use crate::services::auth::build_validator;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,api_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {} ({} routes)",
        config.app_env,
        config.addr,
        config.routes.routes().len()
    );
    for route in config.routes.routes() {
        tracing::debug!(id = %route.id, prefix = %route.prefix, uri = %route.uri, "route");
    }

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

pub(crate) fn build_state(config: &Config) -> Result<AppState> {
    // Per-read rather than total: relayed bodies may take longer than one timeout to stream.
    // Redirects are relayed to the caller, not followed.
    let upstream_timeout = Duration::from_secs(config.upstream_timeout_seconds);
    let http = reqwest::Client::builder()
        .connect_timeout(upstream_timeout)
        .read_timeout(upstream_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("failed to build upstream HTTP client")?;

    let exclusions = ExclusionRules::new(&config.auth_excluded_paths);
    tracing::info!(excluded = ?exclusions.prefixes(), "credential check skipped for these paths");

    Ok(AppState::new(
        build_validator(config),
        Arc::new(exclusions),
        Arc::new(config.routes.clone()),
        http,
    ))
}

/// Outermost first: CORS, transport (request id, limits, trace), authentication, dispatch.
pub(crate) fn build_router(state: AppState, config: &Config) -> Router {
    let router = middleware::auth::access::apply(api::routes(), state.clone()).with_state(state);
    let router = middleware::http::apply(router, HttpLimits::from_config(config));
    middleware::cors::apply(router, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn missing_secret_still_boots_and_refuses_credentials() {
        let config = Config::default();
        let app = build_router(build_state(&config).unwrap(), &config);

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/admin/users")
                    .header("authorization", "Bearer a.b.c")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn preflight_is_answered_before_authentication() {
        let config = Config::default();
        let app = build_router(build_state(&config).unwrap(), &config);

        let res = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/admin/users")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
