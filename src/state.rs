/*
 * Responsibility
 * - Shared, read-only context for every request (AppState)
 *   - credential validator (holds the signing key), exclusion rules, route table, upstream client
 * - Clone is cheap: everything sits behind Arc or is internally reference counted
 */
use std::sync::Arc;

use crate::middleware::auth::ExclusionRules;
use crate::services::auth::CredentialValidator;
use crate::services::route_table::RouteTable;

#[derive(Clone, Debug)]
pub struct AppState {
    pub validator: Arc<dyn CredentialValidator>,
    pub exclusions: Arc<ExclusionRules>,
    pub routes: Arc<RouteTable>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        validator: Arc<dyn CredentialValidator>,
        exclusions: Arc<ExclusionRules>,
        routes: Arc<RouteTable>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            validator,
            exclusions,
            routes,
            http,
        }
    }
}
