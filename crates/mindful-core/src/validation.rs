//! Client-side form validation.
//!
//! Validators never touch the network. Each returns a [`FieldError`] for one
//! field; the `validate_*` form helpers collect every failure so a form can
//! show all of them inline at once.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, FieldError, ValidationErrors};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const EMAIL_MAX: usize = 254;
pub const CODE_LEN: usize = 6;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

static LOCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("locale pattern compiles"));

/// Accumulates field errors across several checks.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(mut self, result: Result<(), FieldError>) -> Self {
        if let Err(e) = result {
            self.errors.push(e);
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    let len = username.chars().count();
    if len == 0 {
        return Err(FieldError::new(Field::Username, "Username is required"));
    }
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(FieldError::new(
            Field::Username,
            format!("Username must be {USERNAME_MIN}-{USERNAME_MAX} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(FieldError::new(
            Field::Username,
            "Username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() {
        return Err(FieldError::new(Field::Email, "Email is required"));
    }
    if email.len() > EMAIL_MAX || !EMAIL.is_match(email) {
        return Err(FieldError::new(Field::Email, "Enter a valid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), FieldError> {
    let len = password.chars().count();
    if len == 0 {
        return Err(FieldError::new(Field::Password, "Password is required"));
    }
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(FieldError::new(
            Field::Password,
            format!("Password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"),
        ));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(FieldError::new(
            Field::Password,
            "Password must contain a letter and a digit",
        ));
    }
    Ok(())
}

pub fn validate_code(code: &str) -> Result<(), FieldError> {
    if code.len() != CODE_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            Field::Code,
            format!("Code must be {CODE_LEN} digits"),
        ));
    }
    Ok(())
}

pub fn validate_locale(locale: &str) -> Result<(), FieldError> {
    if !LOCALE.is_match(locale) {
        return Err(FieldError::new(
            Field::Locale,
            "Locale must look like 'en' or 'en-US'",
        ));
    }
    Ok(())
}

fn required(field: Field, value: &str, label: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, format!("{label} is required")));
    }
    Ok(())
}

/// Login only checks presence; the server owns credential rules.
pub fn validate_login(username: &str, password: &str) -> Result<(), ValidationErrors> {
    Validator::new()
        .check(required(Field::Username, username, "Username"))
        .check(required(Field::Password, password, "Password"))
        .finish()
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationErrors> {
    Validator::new()
        .check(validate_username(username))
        .check(validate_email(email))
        .check(validate_password(password))
        .finish()
}

pub fn validate_verification(email: &str, code: &str) -> Result<(), ValidationErrors> {
    Validator::new()
        .check(validate_email(email))
        .check(validate_code(code))
        .finish()
}
