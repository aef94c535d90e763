use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of repositories a profile record carries.
pub const MAX_REPOS: usize = 6;

/// Public account information for a GitHub user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub public_gists: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub name: String,
    pub spdx_id: String,
}

/// A single owned repository, with its raw README when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub watchers_count: u32,
    pub open_issues_count: u32,
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    pub fork: bool,
    pub has_wiki: bool,
    pub has_pages: bool,
    pub license: Option<LicenseInfo>,
    pub readme_content: Option<String>,
}

/// Consolidated profile produced by a fetcher. Built once per request and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user: UserInfo,
    pub repos: Vec<RepoInfo>,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}
