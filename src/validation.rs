//! Request-field validators shared across handlers, grounded on the
//! teacher's flat free-function validation module.

use crate::error::{Error, Result, ValidationErrors};

pub fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(ValidationErrors::Single {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        }));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    validate_non_empty("email", email)?;
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(Error::Validation(ValidationErrors::Single {
            field: "email".to_string(),
            message: "must be a valid email address".to_string(),
        }));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(Error::Validation(ValidationErrors::Single {
            field: "password".to_string(),
            message: "must be at least 8 characters".to_string(),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_email_without_at_sign() {
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn accepts_plausible_email() {
        assert!(validate_email("user@example.com").is_ok());
    }

    #[test]
    fn rejects_short_password() {
        assert!(validate_password("short").is_err());
    }
}
