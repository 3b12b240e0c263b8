use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // literal pattern, cannot fail to compile
    RE.get_or_init(|| Regex::new(r"^\+91[6-9]\d{9}$").expect("valid phone regex"))
}

/// Validates an Indian mobile number in `+91XXXXXXXXXX` form.
pub fn validate_in_phone(phone: &str) -> AppResult<()> {
    if !phone_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected an Indian mobile number (+91XXXXXXXXXX)".to_string(),
        ));
    }

    Ok(())
}

/// Normalizes common spellings (`98765 43210`, `09876543210`, `919876543210`) to `+91XXXXXXXXXX`.
pub fn format_in_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 12 && digits.starts_with("91") {
        format!("+{digits}")
    } else if digits.len() == 11 && digits.starts_with('0') {
        format!("+91{}", &digits[1..])
    } else if digits.len() == 10 {
        format!("+91{digits}")
    } else {
        phone.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_in_phone() {
        assert!(validate_in_phone("+919876543210").is_ok());
        assert!(validate_in_phone("+91987654321").is_err());
        assert!(validate_in_phone("919876543210").is_err());
        assert!(validate_in_phone("+915876543210").is_err());
    }

    #[test]
    fn test_format_in_phone() {
        assert_eq!(format_in_phone("9876543210"), "+919876543210");
        assert_eq!(format_in_phone("09876543210"), "+919876543210");
        assert_eq!(format_in_phone("919876543210"), "+919876543210");
        assert_eq!(format_in_phone("+91 98765 43210"), "+919876543210");
        assert_eq!(format_in_phone("12345"), "12345");
    }
}
