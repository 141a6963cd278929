//! Subject catalog rules.

use crate::error::CoreError;

pub const TERM_FIRST_HALF: &str = "first_half";
pub const TERM_SECOND_HALF: &str = "second_half";
pub const TERM_FULL_YEAR: &str = "full_year";

/// All valid subject terms, in canonical (stored) form.
pub const VALID_TERMS: &[&str] = &[TERM_FIRST_HALF, TERM_SECOND_HALF, TERM_FULL_YEAR];

/// Category assigned to subjects created implicitly by a timetable import.
pub const IMPORTED_CATEGORY: &str = "imported";

/// Prefix of codes generated for subjects created implicitly by an import.
pub const AUTO_CODE_PREFIX: &str = "AUTO-";

/// Normalize a term to its canonical form.
///
/// Accepts `first_half`, `first-half`, `First Half` and similar spellings.
pub fn normalize_term(term: &str) -> Result<&'static str, CoreError> {
    let key: String = term
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();

    VALID_TERMS
        .iter()
        .find(|t| **t == key)
        .copied()
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid term '{term}'. Must be one of: {}",
                VALID_TERMS.join(", ")
            ))
        })
}

/// Subject codes are short identifiers without whitespace.
pub fn validate_code(code: &str) -> Result<(), CoreError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CoreError::Validation("Subject code is required".into()));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Subject code '{code}' must not contain whitespace"
        )));
    }
    Ok(())
}

/// Generate a fresh code for a subject created implicitly by an import.
pub fn generate_auto_code() -> String {
    auto_code(&uuid::Uuid::new_v4().simple().to_string())
}

/// Build the code for an implicitly created subject from a random token.
pub fn auto_code(token: &str) -> String {
    let suffix: String = token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("{AUTO_CODE_PREFIX}{suffix}")
}
