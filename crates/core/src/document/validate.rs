/// Payload validation utilities shared by every entity.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{} required", .0.join(", "))]
    Required(Vec<&'static str>),
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid payload: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

/// Check that every named text field is present and not blank.
/// All blank fields are reported together.
pub fn require_text(fields: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Required(missing))
    }
}

/// Normalise free text into a URL slug: lowercase ASCII alphanumerics
/// separated by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// A slug is valid when it is non-empty and already in normal form.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Required(vec!["slug"]));
    }
    if slugify(slug) != slug {
        return Err(ValidationError::invalid(
            "slug",
            "may only contain lowercase letters, digits and single dashes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_reports_every_blank_field() {
        let err = require_text(&[("title", " "), ("content", ""), ("author", "Ann")]).unwrap_err();
        assert_eq!(err, ValidationError::Required(vec!["title", "content"]));
        assert_eq!(err.to_string(), "title, content required");
    }

    #[test]
    fn require_text_accepts_filled_fields() {
        assert!(require_text(&[("question", "Why?"), ("answer", "Because.")]).is_ok());
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Student Visa -- Canada!"), "student-visa-canada");
        assert_eq!(slugify("  Work & Travel 2025 "), "work-travel-2025");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn validate_slug_requires_normal_form() {
        assert!(validate_slug("tourist-visa").is_ok());
        assert!(validate_slug("Tourist Visa").is_err());
        assert_eq!(
            validate_slug("").unwrap_err(),
            ValidationError::Required(vec!["slug"])
        );
    }
}
