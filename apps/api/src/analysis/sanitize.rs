//! Profile sanitizer: projects a fetched profile down to the fields the scoring
//! rubric reads, and scrubs README noise that costs tokens without adding signal.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::models::profile::{ProfileRecord, RepoInfo, UserInfo};

pub const MAX_README_CHARS: usize = 2000;
const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Applied in order; the linked-badge pattern must run before the bare-badge one.
static README_CLEANUP_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // inline base64 images: ![alt](data:image/...)
        (r"!\[[^\]]*\]\(data:image/[^)]+\)", ""),
        (r"(?is)<svg.*?</svg>", "[svg-removed]"),
        // shields.io badge wrapped in a link: [![badge](https://img.shields.io/...)](...)
        (r"\[!\[[^\]]*\]\(https?://img\.shields\.io[^)]*\)\]\([^)]*\)", ""),
        (r"!\[[^\]]*\]\(https?://img\.shields\.io[^)]*\)", ""),
        (r"!\[[^\]]*\]\(https?://(?:badges|badge)\.[^)]*\)", ""),
        (r"(?s)<!--.*?-->", ""),
        (r"\n{3,}", "\n\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("README cleanup pattern must compile"),
            replacement,
        )
    })
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedUser<'a> {
    pub login: &'a str,
    pub name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub company: Option<&'a str>,
    pub blog: Option<&'a str>,
    pub location: Option<&'a str>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedRepo<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub language: Option<&'a str>,
    pub stars: u32,
    pub forks: u32,
    pub topics: &'a [String],
    pub homepage: Option<&'a str>,
    pub license: Option<&'a str>,
    pub fork: bool,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub has_readme: bool,
    pub readme_excerpt: Option<String>,
}

/// Minimal profile shape sent to the model. Borrows from the record it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedProfile<'a> {
    pub user: SanitizedUser<'a>,
    pub repos: Vec<SanitizedRepo<'a>>,
}

pub fn sanitize_profile(profile: &ProfileRecord) -> SanitizedProfile<'_> {
    SanitizedProfile {
        user: sanitize_user(&profile.user),
        repos: profile.repos.iter().map(sanitize_repo).collect(),
    }
}

fn sanitize_user(user: &UserInfo) -> SanitizedUser<'_> {
    SanitizedUser {
        login: &user.login,
        name: user.name.as_deref(),
        bio: user.bio.as_deref(),
        company: user.company.as_deref(),
        blog: user.blog.as_deref(),
        location: user.location.as_deref(),
        followers: user.followers,
        following: user.following,
        public_repos: user.public_repos,
        created_at: user.created_at,
    }
}

fn sanitize_repo(repo: &RepoInfo) -> SanitizedRepo<'_> {
    // An empty README body counts as no README.
    let readme = repo.readme_content.as_deref().filter(|r| !r.is_empty());

    SanitizedRepo {
        name: &repo.name,
        description: repo.description.as_deref(),
        language: repo.language.as_deref(),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        topics: &repo.topics,
        homepage: repo.homepage.as_deref(),
        license: repo
            .license
            .as_ref()
            .map(|l| l.spdx_id.as_str())
            .filter(|id| !id.is_empty()),
        fork: repo.fork,
        pushed_at: repo.pushed_at,
        updated_at: repo.updated_at,
        has_readme: readme.is_some(),
        readme_excerpt: readme.map(clean_readme),
    }
}

/// Strips embedded images, SVG, badges and comments, collapses blank runs, then caps the
/// result at `MAX_README_CHARS` characters.
pub fn clean_readme(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for (pattern, replacement) in README_CLEANUP_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }

    let truncated = match cleaned.char_indices().nth(MAX_README_CHARS) {
        Some((cut, _)) => format!("{}{}", &cleaned[..cut], TRUNCATION_MARKER),
        None => cleaned,
    };
    truncated.trim().to_string()
}
