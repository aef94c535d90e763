//! Username normalization: turns a raw handle or profile URL into a GitHub login.

/// GitHub logins are at most 39 characters.
pub const MAX_LOGIN_LENGTH: usize = 39;

const PROFILE_URL_MARKER: &str = "github.com/";

/// Extracts a GitHub login from free-form input.
///
/// Accepts `octocat`, `github.com/octocat`, `https://github.com/octocat/` and similar.
/// Case is preserved; keys are lowercased later by the cache and limiter.
pub fn normalize_username(input: &str) -> Option<String> {
    let mut candidate = input.trim();
    candidate = candidate.strip_suffix('/').unwrap_or(candidate);

    if let Some(idx) = candidate.rfind(PROFILE_URL_MARKER) {
        let after = &candidate[idx + PROFILE_URL_MARKER.len()..];
        if !after.is_empty() {
            candidate = after;
        }
    }

    is_valid_login(candidate).then(|| candidate.to_string())
}

/// 1–39 ASCII alphanumerics or hyphens; no leading hyphen, and every hyphen is
/// followed by an alphanumeric (so no trailing or doubled hyphens).
pub fn is_valid_login(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_LOGIN_LENGTH {
        return false;
    }
    if !bytes[0].is_ascii_alphanumeric() {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| match b {
        b'-' => bytes
            .get(i + 1)
            .is_some_and(|next| next.is_ascii_alphanumeric()),
        _ => b.is_ascii_alphanumeric(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_handle_is_returned_unchanged() {
        assert_eq!(normalize_username("octocat").as_deref(), Some("octocat"));
        assert_eq!(normalize_username("  OctoCat  ").as_deref(), Some("OctoCat"));
    }

    #[test]
    fn test_profile_urls_extract_login() {
        assert_eq!(
            normalize_username("https://github.com/octocat/").as_deref(),
            Some("octocat")
        );
        assert_eq!(
            normalize_username("github.com/torvalds").as_deref(),
            Some("torvalds")
        );
        assert_eq!(
            normalize_username("http://www.github.com/rust-lang").as_deref(),
            Some("rust-lang")
        );
    }

    #[test]
    fn test_last_marker_wins() {
        assert_eq!(
            normalize_username("https://github.com/github.com/octocat").as_deref(),
            Some("octocat")
        );
    }

    #[test]
    fn test_repo_paths_are_rejected() {
        assert_eq!(normalize_username("https://github.com/octocat/hello-world"), None);
    }

    #[test]
    fn test_only_one_trailing_slash_is_dropped() {
        assert_eq!(normalize_username("octocat//"), None);
    }

    #[test]
    fn test_hyphen_rules() {
        assert!(is_valid_login("a-b-c"));
        assert!(!is_valid_login("-abc"));
        assert!(!is_valid_login("abc-"));
        assert!(!is_valid_login("a--b"));
    }

    #[test]
    fn test_length_bounds() {
        assert!(is_valid_login("a"));
        assert!(is_valid_login(&"a".repeat(39)));
        assert!(!is_valid_login(&"a".repeat(40)));
        assert_eq!(normalize_username(""), None);
        assert_eq!(normalize_username("   "), None);
    }

    #[test]
    fn test_rejects_non_ascii_and_symbols() {
        assert_eq!(normalize_username("octo_cat"), None);
        assert_eq!(normalize_username("octo cat"), None);
        assert_eq!(normalize_username("ōctocat"), None);
        assert_eq!(normalize_username("github.com/"), None);
    }

    #[test]
    fn test_accepted_output_always_satisfies_grammar() {
        let inputs = [
            "octocat",
            "https://github.com/A-1/",
            " github.com/xyz ",
            "https://github.com/a-",
            "--",
            "https://gitlab.com/octocat",
        ];
        for input in inputs {
            if let Some(login) = normalize_username(input) {
                assert!(is_valid_login(&login), "{input:?} produced {login:?}");
                assert!(!login.contains('/'));
            }
        }
    }
}
