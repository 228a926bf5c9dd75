//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest slug accepted for a game.
pub const MAX_SLUG_LENGTH: usize = 100;

/// Validates that a slug is 1 to 100 characters of lowercase ASCII letters,
/// digits, `-` or `_`.
///
/// # Examples
///
/// ```ignore
/// validate_slug("honkai-star-rail") // Ok
/// validate_slug("Honkai")           // Err - uppercase
/// validate_slug("a/b")              // Err - path separator
/// ```
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
        let mut err = ValidationError::new("slug_length");
        err.message = Some(
            format!(
                "Slug must be between 1 and {MAX_SLUG_LENGTH} characters (got {})",
                slug.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !slug
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_'))
    {
        let mut err = ValidationError::new("slug_format");
        err.message =
            Some("Slug may only contain lowercase letters, digits, '-' and '_'".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects empty and whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug_valid() {
        assert!(validate_slug("genshin").is_ok());
        assert!(validate_slug("honkai-star-rail").is_ok());
        assert!(validate_slug("blue_archive_2").is_ok());
    }

    #[test]
    fn test_validate_slug_invalid_length() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)).is_err());
        assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_slug_invalid_format() {
        assert!(validate_slug("Genshin").is_err()); // uppercase
        assert!(validate_slug("star rail").is_err()); // space
        assert!(validate_slug("a/b").is_err()); // separator
        assert!(validate_slug("café").is_err()); // non-ascii
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \n\t").is_err());
    }
}
