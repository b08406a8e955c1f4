//! Input validation primitives.

use crate::error::{Error, Result};

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None))
    } else {
        Ok(trimmed)
    }
}

/// Require a short identifier made of ASCII letters, digits, `_`, `-` or `:`.
///
/// Renderer output formats look like `png`, `svg` or `png:cairo`.
pub fn require_token<'a>(value: &'a str, field: &str, examples: &[&str]) -> Result<&'a str> {
    let trimmed = require_non_empty(value, field, "Value cannot be empty")?;
    let valid = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'));

    if valid {
        Ok(trimmed)
    } else {
        Err(Error::validation_invalid_argument(
            field,
            format!("'{}' is not a valid {}", trimmed, field),
            Some(examples.iter().map(|e| e.to_string()).collect()),
        ))
    }
}
