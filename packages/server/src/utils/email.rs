use crate::error::AppError;

/// Canonical form used for storage and matching: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an already-normalized email address.
///
/// Only the shape is checked: exactly one `@` with non-empty local and domain
/// parts, no whitespace, at most 254 chars. Dotless domains such as
/// `a@localhost` are accepted.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation(format!("Invalid email address: '{email}'"));

    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    Ok(())
}
