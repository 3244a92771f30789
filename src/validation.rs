//! Local input validation for the account forms
//!
//! Everything here runs before any provider call: a value that fails these
//! checks never leaves the process.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Minimum accepted password length
pub const PASSWORD_MIN_LEN: usize = 6;
/// Maximum accepted password length
pub const PASSWORD_MAX_LEN: usize = 60;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern is valid")
});

/// A user-facing validation or provider message attached to a form field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Please enter a valid email.")]
    InvalidEmail,

    #[error("Email address is not correct. Try again")]
    IncorrectNewEmail,

    #[error("Your password must contain between 6 and 60 characters.")]
    PasswordLength,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("Passwords are not equal.")]
    PasswordsNotEqual,

    #[error("Wrong password. Please enter a correct password.")]
    WrongPassword,

    #[error("Wrong password. Try again")]
    WrongCurrentPassword,

    #[error("Email does not exist. Please enter a correct email.")]
    UserNotFound,

    #[error("Email already exists. Please enter a correct email.")]
    EmailAlreadyInUse,

    #[error("Choose a plan first.")]
    NoPlanSelected,

    #[error("Profile name cannot be empty.")]
    EmptyProfileName,
}

/// Check an email address against the accepted pattern
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Validate an email field
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() || !is_valid_email(email) {
        return Err(FieldError::InvalidEmail);
    }
    Ok(())
}

/// Validate a password field: required, then 6..=60 characters.
///
/// Lengths are counted in characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    let len = password.chars().count();
    if len == 0 || len > PASSWORD_MAX_LEN {
        return Err(FieldError::PasswordLength);
    }
    if len < PASSWORD_MIN_LEN {
        return Err(FieldError::WeakPassword);
    }
    Ok(())
}

/// Validate that a repeated password matches
pub fn validate_repeat(password: &str, repeat: &str) -> Result<(), FieldError> {
    if password != repeat {
        return Err(FieldError::PasswordsNotEqual);
    }
    Ok(())
}
