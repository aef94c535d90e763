use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the rate-limit store, result cache and both upstream clients.
    pub pipeline: Arc<AnalysisPipeline>,
}
