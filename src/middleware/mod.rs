/*
 * Responsibility
 * - Public entry points of the gateway middleware
 * - Layer order (outermost first): cors → http (request id, limit, timeout, trace) → auth
 */
pub mod auth;
pub mod cors;
pub mod http;
