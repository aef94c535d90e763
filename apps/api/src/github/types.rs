//! Wire shapes of the GitHub REST responses we read, and their projection into the
//! profile model. Every field GitHub may omit or null is defaulted here.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::profile::{LicenseInfo, RepoInfo, UserInfo};

/// `GET /users/{username}`
#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub public_gists: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RawUser> for UserInfo {
    fn from(raw: RawUser) -> Self {
        UserInfo {
            login: raw.login,
            name: raw.name,
            bio: raw.bio,
            avatar_url: raw.avatar_url,
            html_url: raw.html_url,
            company: raw.company,
            location: raw.location,
            blog: raw.blog,
            twitter_username: raw.twitter_username,
            followers: raw.followers,
            following: raw.following,
            public_repos: raw.public_repos,
            public_gists: raw.public_gists,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawLicense {
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

/// One item of `GET /users/{username}/repos`
#[derive(Debug, Deserialize)]
pub struct RawRepo {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: Option<u32>,
    pub forks_count: Option<u32>,
    pub watchers_count: Option<u32>,
    pub open_issues_count: Option<u32>,
    pub topics: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    pub fork: Option<bool>,
    pub has_wiki: Option<bool>,
    pub has_pages: Option<bool>,
    pub license: Option<RawLicense>,
}

impl RawRepo {
    pub fn into_repo_info(self, readme_content: Option<String>) -> RepoInfo {
        RepoInfo {
            name: self.name,
            full_name: self.full_name,
            html_url: self.html_url,
            description: self.description,
            language: self.language,
            stargazers_count: self.stargazers_count.unwrap_or(0),
            forks_count: self.forks_count.unwrap_or(0),
            watchers_count: self.watchers_count.unwrap_or(0),
            open_issues_count: self.open_issues_count.unwrap_or(0),
            topics: self.topics.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            pushed_at: self.pushed_at,
            homepage: self.homepage,
            fork: self.fork.unwrap_or(false),
            has_wiki: self.has_wiki.unwrap_or(false),
            has_pages: self.has_pages.unwrap_or(false),
            license: self.license.map(|l| LicenseInfo {
                name: l.name.unwrap_or_default(),
                spdx_id: l.spdx_id.unwrap_or_default(),
            }),
            readme_content,
        }
    }
}

/// Error body GitHub sends with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct RawApiError {
    pub message: String,
}
