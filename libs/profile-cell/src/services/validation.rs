use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ProfileError, ProfileUpdate};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9\s\-\.\(\)]{5,19}$").expect("phone pattern compiles")
});

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;

pub struct ProfileValidator;

impl ProfileValidator {
    pub fn validate_email(email: &str) -> bool {
        EMAIL_PATTERN.is_match(email) && email.len() <= MAX_EMAIL_LENGTH
    }

    pub fn validate_phone(phone: &str) -> bool {
        PHONE_PATTERN.is_match(phone) && phone.chars().filter(char::is_ascii_digit).count() >= 6
    }

    /// Trims every provided field and checks it. Fields left out of the
    /// update are not touched. An empty phone clears the number.
    pub fn validate_update(update: &ProfileUpdate) -> Result<ProfileUpdate, ProfileError> {
        if update.is_empty() {
            return Err(ProfileError::EmptyUpdate);
        }

        let mut errors = Vec::new();
        let trim = |value: &Option<String>| value.as_ref().map(|v| v.trim().to_string());

        let first_name = trim(&update.first_name);
        let last_name = trim(&update.last_name);
        let email = trim(&update.email);
        let phone = trim(&update.phone);

        for (label, name) in [("First name", &first_name), ("Last name", &last_name)] {
            match name.as_deref() {
                Some("") => errors.push(format!("{} cannot be empty", label)),
                Some(value) if value.chars().count() > MAX_NAME_LENGTH => {
                    errors.push(format!("{} is too long", label))
                }
                _ => {}
            }
        }

        if let Some(value) = email.as_deref() {
            if !Self::validate_email(value) {
                errors.push("Please enter a valid email address".to_string());
            }
        }

        if let Some(value) = phone.as_deref() {
            if !value.is_empty() && !Self::validate_phone(value) {
                errors.push("Please enter a valid phone number".to_string());
            }
        }

        if !errors.is_empty() {
            debug!("Profile update rejected: {:?}", errors);
            return Err(ProfileError::Validation(errors));
        }

        Ok(ProfileUpdate {
            first_name,
            last_name,
            email,
            phone,
        })
    }
}
