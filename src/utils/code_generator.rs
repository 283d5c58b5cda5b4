//! Short code generation and custom slug validation.

use crate::error::AppError;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Length of generated short codes.
pub const CODE_LENGTH: usize = 6;

const SLUG_MIN_LENGTH: usize = 3;
const SLUG_MAX_LENGTH: usize = 50;

static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Slugs that would shadow fixed routes.
const RESERVED_SLUGS: &[&str] = &["api", "health"];

/// Draws a short code of [`CODE_LENGTH`] characters uniformly from `[A-Za-z0-9]`.
///
/// Codes are unique only once checked against the store; they are not meant
/// to be unguessable.
pub fn generate_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Validates an owner-supplied custom slug.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    let len = slug.chars().count();
    if !(SLUG_MIN_LENGTH..=SLUG_MAX_LENGTH).contains(&len) {
        return Err(AppError::bad_request(
            "Custom slug must be 3-50 characters",
            json!({ "provided_length": len }),
        ));
    }

    if !SLUG_REGEX.is_match(slug) {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(slug))
    {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_correct_length() {
        assert_eq!(generate_code().len(), CODE_LENGTH);
    }

    #[test]
    fn test_generate_code_alphanumeric_only() {
        for _ in 0..200 {
            let code = generate_code();
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code()).collect();
        assert!(codes.len() > 990);
    }

    #[test]
    fn test_generate_code_uses_both_cases_and_digits() {
        let joined: String = (0..500).map(|_| generate_code()).collect();

        assert!(joined.chars().any(|c| c.is_ascii_uppercase()));
        assert!(joined.chars().any(|c| c.is_ascii_lowercase()));
        assert!(joined.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_validate_accepts_typical_slugs() {
        for slug in ["promo", "Spring_Sale-2024", "abc", "a1b2c3"] {
            assert!(validate_custom_slug(slug).is_ok(), "{slug}");
        }
    }

    #[test]
    fn test_validate_length_bounds() {
        assert!(validate_custom_slug("ab").is_err());
        assert!(validate_custom_slug(&"x".repeat(50)).is_ok());
        assert!(validate_custom_slug(&"x".repeat(51)).is_err());
        assert!(validate_custom_slug("").is_err());
    }

    #[test]
    fn test_validate_rejects_special_characters() {
        for slug in ["my slug", "promo!", "a/b", "über"] {
            let err = validate_custom_slug(slug).unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "{slug}");
        }
    }

    #[test]
    fn test_validate_rejects_reserved() {
        for &reserved in RESERVED_SLUGS {
            assert!(validate_custom_slug(reserved).is_err());
        }
        assert!(validate_custom_slug("API").is_err());
    }
}
