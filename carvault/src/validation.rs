//! Input validation for car payloads and registrations.
//!
//! Text fields are trimmed before any rule is checked. All violations are reported together in a
//! single [`Error::Validation`], e.g. `Invalid input data. Title must be at least 3 characters.
//! At least one tag is required`.

use url::Url;

use crate::config::PasswordConfig;
use crate::errors::Error;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const IMAGES_MIN: usize = 1;
pub const IMAGES_MAX: usize = 10;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;

/// Car fields after trimming and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCar {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

/// Registration fields after normalization and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub email: String,
    pub name: String,
    pub password: String,
}

fn into_result<T>(value: T, violations: Vec<String>) -> Result<T, Error> {
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(Error::Validation {
            message: format!("Invalid input data. {}", violations.join(". ")),
        })
    }
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

pub fn validate_car(title: &str, description: &str, tags: &[String], images: &[String]) -> Result<ValidCar, Error> {
    let mut violations = Vec::new();

    let title = title.trim().to_string();
    let title_len = title.chars().count();
    if title_len < TITLE_MIN {
        violations.push(format!("Title must be at least {TITLE_MIN} characters"));
    } else if title_len > TITLE_MAX {
        violations.push(format!("Title cannot exceed {TITLE_MAX} characters"));
    }

    let description = description.trim().to_string();
    if description.chars().count() < DESCRIPTION_MIN {
        violations.push(format!("Description must be at least {DESCRIPTION_MIN} characters"));
    }

    let tags: Vec<String> = tags.iter().map(|tag| tag.trim().to_string()).collect();
    if tags.is_empty() {
        violations.push("At least one tag is required".to_string());
    } else if tags.iter().any(String::is_empty) {
        violations.push("Tags cannot be empty".to_string());
    }

    let images: Vec<String> = images.iter().map(|image| image.trim().to_string()).collect();
    if images.len() < IMAGES_MIN {
        violations.push("At least one image is required".to_string());
    } else if images.len() > IMAGES_MAX {
        violations.push(format!("Maximum {IMAGES_MAX} images allowed"));
    }
    if let Some(bad) = images.iter().find(|image| !is_web_url(image)) {
        violations.push(format!("Invalid image URL: {bad}"));
    }

    into_result(
        ValidCar {
            title,
            description,
            tags,
            images,
        },
        violations,
    )
}

/// Trim and lower-case an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub fn validate_registration(email: &str, password: &str, name: &str, rules: &PasswordConfig) -> Result<ValidRegistration, Error> {
    let mut violations = Vec::new();

    let email = normalize_email(email);
    if !is_email(&email) {
        violations.push("Please provide a valid email".to_string());
    }

    let name = name.trim().to_string();
    let name_len = name.chars().count();
    if name_len < NAME_MIN {
        violations.push(format!("Name must be at least {NAME_MIN} characters"));
    } else if name_len > NAME_MAX {
        violations.push(format!("Name cannot exceed {NAME_MAX} characters"));
    }

    let password_len = password.chars().count();
    if password_len < rules.min_length {
        violations.push(format!("Password must be at least {} characters", rules.min_length));
    } else if password_len > rules.max_length {
        violations.push(format!("Password must be no more than {} characters", rules.max_length));
    }

    into_result(
        ValidRegistration {
            email,
            name,
            password: password.to_string(),
        },
        violations,
    )
}
