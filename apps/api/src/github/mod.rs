//! GitHub profile fetcher: user lookup, recent owned repositories and their READMEs.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::profile::{ProfileRecord, UserInfo, MAX_REPOS};

mod types;
pub use types::*;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("hireability/", env!("CARGO_PKG_VERSION"));
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not Found")]
    NotFound,

    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    #[error("Bad credentials")]
    BadCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Source of consolidated profile records.
///
/// Implementations return at most `MAX_REPOS` owned repositories, most recently updated
/// first, each with its README attached when one exists.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, username: &str) -> Result<ProfileRecord, FetchError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: String, token: Option<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .get(path)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_user(&self, username: &str) -> Result<UserInfo, FetchError> {
        let raw: RawUser = self.get_json(&format!("/users/{username}")).await?;
        Ok(raw.into())
    }

    async fn fetch_repos(&self, username: &str) -> Result<Vec<RawRepo>, FetchError> {
        let mut repos: Vec<RawRepo> = self
            .get_json(&format!(
                "/users/{username}/repos?sort=updated&direction=desc&per_page={MAX_REPOS}&type=owner"
            ))
            .await?;
        repos.truncate(MAX_REPOS);
        Ok(repos)
    }

    /// Raw README text, or `None` when the repository has none.
    async fn fetch_readme(&self, owner: &str, repo: &str) -> Result<Option<String>, FetchError> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/readme"))
            .header(header::ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.text().await?))
    }
}

#[async_trait]
impl ProfileFetcher for GitHubClient {
    #[instrument(skip(self))]
    async fn fetch(&self, username: &str) -> Result<ProfileRecord, FetchError> {
        let user = self.fetch_user(username).await?;
        let raw_repos = self.fetch_repos(username).await?;
        debug!("Fetched {} repos for {}", raw_repos.len(), username);

        // README reads are independent; a failed read only drops that README.
        let readme_futures = raw_repos.iter().map(|repo| async move {
            match self.fetch_readme(username, &repo.name).await {
                Ok(readme) => readme,
                Err(e) => {
                    warn!("Failed to fetch README for {}/{}: {}", username, repo.name, e);
                    None
                }
            }
        });
        let readmes = join_all(readme_futures).await;

        let repos = raw_repos
            .into_iter()
            .zip(readmes)
            .map(|(repo, readme)| repo.into_repo_info(readme))
            .collect();

        Ok(ProfileRecord {
            user,
            repos,
            fetched_at: Utc::now(),
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, remaining.as_deref(), body))
}

fn error_for_status(status: StatusCode, ratelimit_remaining: Option<&str>, body: String) -> FetchError {
    let message = serde_json::from_str::<RawApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound,
        StatusCode::UNAUTHORIZED => FetchError::BadCredentials,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            if ratelimit_remaining == Some("0")
                || message.to_lowercase().contains("rate limit") =>
        {
            FetchError::RateLimited
        }
        _ => FetchError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
