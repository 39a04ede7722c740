//! Phone number validation.

use crate::error::{DialbackError, Result};

/// Validates that a string is a valid phone number (E.164 format recommended)
///
/// Common formatting characters (whitespace, hyphens, parentheses) are
/// stripped before checking.
///
/// # Example
///
/// ```rust
/// use dialback::validation::validate_phone;
///
/// assert!(validate_phone("+441234567890").is_ok());
/// assert!(validate_phone("(555) 555-0100").is_ok());
/// assert!(validate_phone("not a number").is_err());
/// ```
pub fn validate_phone(phone: &str) -> Result<()> {
    // Remove common formatting characters
    let cleaned: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '(' && *c != ')')
        .collect();

    // E.164 format: + followed by 1-15 digits
    if let Some(digits) = cleaned.strip_prefix('+') {
        if !digits.is_empty() && digits.len() <= 15 && digits.chars().all(|c| c.is_ascii_digit()) {
            return Ok(());
        }
    }

    // Also accept 10-digit US format
    if cleaned.len() == 10 && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }

    Err(DialbackError::invalid_number(
        "must be a valid phone number (E.164 format: +1234567890 or 10-digit format)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+1234567890").is_ok());
        assert!(validate_phone("+44 1234 567890").is_ok());
        assert!(validate_phone("5555550100").is_ok());
        assert!(validate_phone("(555) 555-0100").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("+").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+123456789012345678").is_err());
        assert!(validate_phone("phone").is_err());
    }
}
