/*
 * Responsibility
 * - Gateway surface: every path falls through to route dispatch
 * - No handlers of its own (health and login live in the backends)
 */
use axum::Router;

use crate::state::AppState;

pub mod handlers;

pub fn routes() -> Router<AppState> {
    Router::new().fallback(handlers::proxy::forward)
}
