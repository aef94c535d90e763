use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::analysis::scoring::ScoringError;
use crate::github::FetchError;
use crate::models::analysis::AnalysisResponse;

/// Every way an analysis request can fail.
///
/// The `Display` text is for logs. Callers only ever see `user_message()`, which never
/// carries upstream error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Admission denied, retry after {retry_after_ms}ms")]
    AdmissionDenied { retry_after_ms: u64 },

    #[error("Input is not a GitHub username or profile URL")]
    InvalidInput,

    #[error("Username exceeds 39 characters")]
    UsernameTooLong,

    #[error("GitHub user {username} not found")]
    NotFound { username: String },

    #[error("GitHub API rate limit reached")]
    UpstreamRateLimited,

    #[error("GitHub rejected the configured token")]
    BadCredentials,

    #[error("Scoring model API key is not configured")]
    MissingConfig,

    #[error("Scoring model quota exceeded")]
    ModelQuotaExceeded,

    #[error("Scoring model not found")]
    ModelNotFound,

    #[error("Unclassified analysis failure")]
    Unclassified,
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::AdmissionDenied { .. } => "ADMISSION_DENIED",
            AnalysisError::InvalidInput => "INVALID_INPUT",
            AnalysisError::UsernameTooLong => "INVALID_INPUT",
            AnalysisError::NotFound { .. } => "NOT_FOUND",
            AnalysisError::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            AnalysisError::BadCredentials => "BAD_CREDENTIALS",
            AnalysisError::MissingConfig => "MISSING_CONFIG",
            AnalysisError::ModelQuotaExceeded => "MODEL_QUOTA_EXCEEDED",
            AnalysisError::ModelNotFound => "MODEL_NOT_FOUND",
            AnalysisError::Unclassified => "UNCLASSIFIED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::AdmissionDenied { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::InvalidInput | AnalysisError::UsernameTooLong => StatusCode::BAD_REQUEST,
            AnalysisError::NotFound { .. } => StatusCode::NOT_FOUND,
            AnalysisError::UpstreamRateLimited | AnalysisError::ModelQuotaExceeded => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AnalysisError::BadCredentials
            | AnalysisError::MissingConfig
            | AnalysisError::ModelNotFound => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Unclassified => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::AdmissionDenied { retry_after_ms } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after_secs(*retry_after_ms)
            ),
            AnalysisError::InvalidInput => {
                "Please enter a valid GitHub username or profile URL.".to_string()
            }
            AnalysisError::UsernameTooLong => "Username is too long.".to_string(),
            AnalysisError::NotFound { username } => format!(
                "GitHub user \"{username}\" not found. Please check the username and try again."
            ),
            AnalysisError::UpstreamRateLimited => {
                "GitHub API rate limit reached. Please try again in a few minutes.".to_string()
            }
            AnalysisError::BadCredentials => {
                "GitHub token is invalid. Please check the GITHUB_TOKEN setting.".to_string()
            }
            AnalysisError::MissingConfig => {
                "AI service is not configured. Please add OPENROUTER_API_KEY to the server environment."
                    .to_string()
            }
            AnalysisError::ModelQuotaExceeded => {
                "AI service rate limit reached. Please wait 1-2 minutes and try again.".to_string()
            }
            AnalysisError::ModelNotFound => {
                "AI model configuration error. Please contact the administrator.".to_string()
            }
            AnalysisError::Unclassified => {
                "An unexpected error occurred during analysis. Please try again in a moment."
                    .to_string()
            }
        }
    }

    /// Maps a fetcher failure. Typed kinds map directly; untyped ones go through the
    /// message classifier.
    pub fn from_fetch(err: &FetchError, username: &str) -> Self {
        match err {
            FetchError::NotFound => AnalysisError::NotFound {
                username: username.to_string(),
            },
            FetchError::RateLimited => AnalysisError::UpstreamRateLimited,
            FetchError::BadCredentials => AnalysisError::BadCredentials,
            FetchError::Http(_) | FetchError::Api { .. } => {
                classify_message(&err.to_string(), username)
            }
        }
    }
}

impl From<ScoringError> for AnalysisError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::MissingApiKey => AnalysisError::MissingConfig,
        }
    }
}

/// Last-resort classifier for failures that arrive as bare text.
///
/// Checks run in a fixed order because the substrings overlap: "model ... not found" must
/// not land in the user-not-found branch, and quota messages that mention "rate limit"
/// belong to the model.
pub fn classify_message(message: &str, username: &str) -> AnalysisError {
    let message = message.to_lowercase();

    if message.contains("not found") && !message.contains("model") {
        AnalysisError::NotFound {
            username: username.to_string(),
        }
    } else if message.contains("rate limit") && !message.contains("quota") {
        AnalysisError::UpstreamRateLimited
    } else if message.contains("bad credentials") {
        AnalysisError::BadCredentials
    } else if message.contains("openrouter_api_key") {
        AnalysisError::MissingConfig
    } else if message.contains("429")
        || message.contains("quota")
        || message.contains("too many requests")
        || message.contains("resource exhausted")
    {
        AnalysisError::ModelQuotaExceeded
    } else if message.contains("model") && message.contains("not found") {
        AnalysisError::ModelNotFound
    } else {
        AnalysisError::Unclassified
    }
}

fn retry_after_secs(retry_after_ms: u64) -> u64 {
    retry_after_ms.div_ceil(1000)
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(AnalysisResponse::failure(self.user_message()));

        match self {
            AnalysisError::AdmissionDenied { retry_after_ms } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs(retry_after_ms).to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
