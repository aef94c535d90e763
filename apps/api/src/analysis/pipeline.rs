//! Pipeline Orchestrator: sequences admission, normalization, cache, fetch and scoring
//! for one analysis request.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::cache::AnalysisCache;
use crate::analysis::normalize::{normalize_username, MAX_LOGIN_LENGTH};
use crate::analysis::rate_limit::RateLimiter;
use crate::analysis::scoring::ScoringEngine;
use crate::errors::AnalysisError;
use crate::github::ProfileFetcher;
use crate::models::analysis::AnalysisResponse;

pub struct AnalysisPipeline {
    limiter: Arc<RateLimiter>,
    cache: Arc<AnalysisCache>,
    fetcher: Arc<dyn ProfileFetcher>,
    engine: ScoringEngine,
}

impl AnalysisPipeline {
    pub fn new(
        limiter: Arc<RateLimiter>,
        cache: Arc<AnalysisCache>,
        fetcher: Arc<dyn ProfileFetcher>,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            limiter,
            cache,
            fetcher,
            engine,
        }
    }

    /// Runs one analysis. `raw_input` is `None` when the caller sent something other than
    /// a string; that is rejected as invalid input after admission.
    ///
    /// Errors carry only the taxonomy kind; the axum layer turns them into the failure
    /// response shape.
    pub async fn analyze(
        &self,
        raw_input: Option<&str>,
        client_id: &str,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let span = info_span!("analysis", id = %Uuid::new_v4(), client = %client_id);
        self.run(raw_input, client_id).instrument(span).await
    }

    async fn run(
        &self,
        raw_input: Option<&str>,
        client_id: &str,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let decision = self.limiter.check(client_id);
        if !decision.allowed {
            let retry_after_ms = decision.retry_after_ms.unwrap_or_default();
            warn!(
                "Rate limit exceeded for {}. Retry after {}s",
                client_id,
                retry_after_ms.div_ceil(1000)
            );
            return Err(AnalysisError::AdmissionDenied { retry_after_ms });
        }
        debug!(
            "Rate limit check passed for {} ({} remaining)",
            client_id, decision.remaining
        );

        let username = raw_input
            .and_then(normalize_username)
            .ok_or(AnalysisError::InvalidInput)?;
        if username.len() > MAX_LOGIN_LENGTH {
            return Err(AnalysisError::UsernameTooLong);
        }

        if let Some(cached) = self.cache.get(&username) {
            return Ok(cached);
        }

        info!("Fetching GitHub profile for {}", username);
        let profile = self.fetcher.fetch(&username).await.map_err(|e| {
            let err = AnalysisError::from_fetch(&e, &username);
            warn!("Profile fetch for {} failed [{}]: {}", username, err.code(), e);
            err
        })?;

        info!("Scoring profile for {}", username);
        let result = self.engine.score(&profile).await.map_err(|e| {
            error!("Scoring for {} failed: {}", username, e);
            AnalysisError::from(e)
        })?;

        let response = AnalysisResponse::success(result, profile);
        self.cache.put(&username, response.clone());
        Ok(response)
    }
}
