// crates/quill-core/src/origin.rs
//
// Origin helpers. An origin is a bare host with an optional port, e.g.
// `blog.example.com` or `127.0.0.1:8080`. Trust is a plain lookup on this
// string, so every entry point normalizes before comparing or storing.

use crate::error::QuillError;

/// Normalize a user- or peer-supplied origin.
///
/// Trims whitespace, strips an `http://` / `https://` prefix and trailing
/// slashes, and lowercases the host. Rejects empty values and values that
/// still contain whitespace or a path after normalization.
pub fn normalize_origin(raw: &str) -> Result<String, QuillError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let origin = without_scheme.trim_end_matches('/');

    if origin.is_empty() {
        return Err(QuillError::InvalidInput("origin is empty".to_string()));
    }
    if origin.contains('/') || origin.chars().any(char::is_whitespace) {
        return Err(QuillError::InvalidInput(format!(
            "origin '{}' must be a bare host[:port]",
            raw.trim()
        )));
    }
    if origin.contains('?') || origin.contains('#') || origin.contains('@') {
        return Err(QuillError::InvalidInput(format!(
            "origin '{}' must not carry query, fragment or userinfo",
            raw.trim()
        )));
    }

    Ok(origin.to_string())
}

/// Build an absolute URL on a remote origin: `{scheme}://{origin}{path}`.
///
/// `path` is expected to start with `/`.
pub fn origin_url(scheme: &str, origin: &str, path: &str) -> String {
    format!("{}://{}{}", scheme, origin, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_host() {
        assert_eq!(normalize_origin("blog.example.com").unwrap(), "blog.example.com");
    }

    #[test]
    fn test_normalize_strips_scheme_and_slash() {
        assert_eq!(
            normalize_origin("  https://Blog.Example.com/ ").unwrap(),
            "blog.example.com"
        );
        assert_eq!(normalize_origin("http://127.0.0.1:8080").unwrap(), "127.0.0.1:8080");
    }

    #[test]
    fn test_normalize_rejects_paths_and_empty() {
        assert!(normalize_origin("").is_err());
        assert!(normalize_origin("   ").is_err());
        assert!(normalize_origin("https://").is_err());
        assert!(normalize_origin("example.com/posts").is_err());
        assert!(normalize_origin("exa mple.com").is_err());
        assert!(normalize_origin("example.com?x=1").is_err());
        assert!(normalize_origin("user@example.com").is_err());
    }

    #[test]
    fn test_origin_url() {
        assert_eq!(
            origin_url("https", "b.example", "/api/check-connection"),
            "https://b.example/api/check-connection"
        );
    }
}
