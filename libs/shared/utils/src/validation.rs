//! Field checks shared by the registration, profile and admin flows.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

static PHONE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").ok());

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.as_ref().is_some_and(|re| re.is_match(phone))
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if !(2..=100).contains(&len) {
        return Err("Name must be between 2 and 100 characters".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if !is_valid_email(email.trim()) {
        return Err("Please provide a valid email".to_string());
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if !is_valid_phone(phone.trim()) {
        return Err("Please provide a valid phone number".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_valid_email("jane.doe+dental@example.co.uk"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn phones() {
        assert!(is_valid_phone("+15551234567"));
        assert!(is_valid_phone("5551234"));
        assert!(!is_valid_phone("0123"));
        assert!(!is_valid_phone("555-1234"));
    }

    #[test]
    fn names_and_passwords() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }
}
