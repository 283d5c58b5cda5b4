//! Destination URL validation.

use crate::error::AppError;
use serde_json::json;
use url::Url;

/// Checks that `raw` is an absolute `http`/`https` URL with a host.
///
/// Returns the trimmed input unchanged; the destination is stored exactly as
/// the owner wrote it.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the URL is empty, malformed, relative,
/// uses another scheme or has no host.
pub fn validate_destination(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::bad_request(
            "Original URL is required",
            json!({ "field": "original_url" }),
        ));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "URL scheme must be http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::bad_request(
            "URL must include a host",
            json!({ "url": trimmed }),
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            validate_destination("https://example.com/path?q=1").unwrap(),
            "https://example.com/path?q=1"
        );
        assert!(validate_destination("http://localhost:8080").is_ok());
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            validate_destination("  https://example.com  ").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        for url in ["ftp://example.com", "javascript:alert(1)", "mailto:a@b.c"] {
            assert!(
                matches!(validate_destination(url), Err(AppError::Validation { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(validate_destination("not-a-url").is_err());
        assert!(validate_destination("/relative/path").is_err());
        assert!(validate_destination("").is_err());
        assert!(validate_destination("   ").is_err());
    }
}
