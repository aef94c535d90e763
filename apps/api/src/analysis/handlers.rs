use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::AnalysisError;
use crate::models::analysis::AnalysisResponse;
use crate::state::AppState;

/// Shared by every caller that sends no identifying header.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// `username` stays untyped so a non-string value reaches the pipeline and is rejected
/// there as invalid input instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub username: Value,
}

/// POST /api/v1/analyze
///
/// An unreadable body is treated like a non-string username: it still counts against
/// the client's rate limit and fails as invalid input.
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AnalysisError> {
    let client_id = client_identifier(&headers);
    let username = match body {
        Ok(Json(req)) => req.username,
        Err(rejection) => {
            debug!("Rejected analyze body from {}: {}", client_id, rejection.body_text());
            Value::Null
        }
    };
    let response = state
        .pipeline
        .analyze(username.as_str(), &client_id)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/report/:username
pub async fn handle_report(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AnalysisResponse>, AnalysisError> {
    let client_id = client_identifier(&headers);
    let response = state.pipeline.analyze(Some(&username), &client_id).await?;
    Ok(Json(response))
}

/// First `x-forwarded-for` hop, else `x-real-ip`, else the shared anonymous bucket.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}
