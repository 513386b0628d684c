// models/src/validation.rs

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref EMPLOYEE_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9]{6}$").unwrap();
    // International dialing shape: optional +, then 7 to 15 digits, no
    // leading zero after the prefix.
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9][0-9]{6,14}$").unwrap();
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_employee_id(value: &str) -> bool {
    EMPLOYEE_ID_RE.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// Password policy for registration: at least 8 characters with one
/// lowercase letter, one uppercase letter, one digit and one character
/// outside `[A-Za-z0-9_]`.
pub fn is_strong_password(value: &str) -> bool {
    value.len() >= 8
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_ascii_alphanumeric() && c != '_')
}
