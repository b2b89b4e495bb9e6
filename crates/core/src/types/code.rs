//! Institution (invite) code normalization.
//!
//! Codes are typed by humans, so matching ignores case and surrounding
//! whitespace: `" plat-2024 "` and `"PLAT-2024"` name the same code. Codes are
//! stored already normalized.

/// Maximum length of a normalized institution code.
pub const MAX_CODE_LENGTH: usize = 64;

/// Errors produced while normalizing an institution code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstitutionCodeError {
    #[error("institution code is required")]
    Empty,
    #[error("institution code must be at most {MAX_CODE_LENGTH} characters")]
    TooLong,
}

/// Trim and upper-case an institution code.
///
/// # Errors
///
/// Returns [`InstitutionCodeError::Empty`] for blank input and
/// [`InstitutionCodeError::TooLong`] past [`MAX_CODE_LENGTH`] characters.
pub fn normalize_code(raw: &str) -> Result<String, InstitutionCodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InstitutionCodeError::Empty);
    }
    if trimmed.chars().count() > MAX_CODE_LENGTH {
        return Err(InstitutionCodeError::TooLong);
    }
    Ok(trimmed.to_uppercase())
}
