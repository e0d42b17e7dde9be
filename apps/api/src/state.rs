use std::sync::Arc;

use crate::config::Config;
use crate::interview::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Nothing in here is mutable; interview history travels with each request.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Config,
}
