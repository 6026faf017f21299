use thiserror::Error;
use url::Url;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Submit-time checks run before a payload is sent to the backend.
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

pub fn required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub fn max_length(field: &'static str, value: &str, max: usize) -> ValidationResult {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> ValidationResult {
    let trimmed = value.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ValidationError::new(field, "must be an email address"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(ValidationError::new(field, "must be an email address"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(field, "must not contain whitespace"));
    }
    Ok(())
}

pub fn http_url(field: &'static str, value: &str) -> ValidationResult {
    let invalid = || ValidationError::new(field, "must be an http(s) URL");
    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(())
}

pub fn phone(field: &'static str, value: &str) -> ValidationResult {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'));
    if !allowed || !(7..=15).contains(&digits) {
        return Err(ValidationError::new(field, "must be a phone number"));
    }
    Ok(())
}

pub fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> ValidationResult,
) -> ValidationResult {
    match value {
        Some(inner) => check(inner),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rejects_missing_domain() {
        assert!(email("email", "ada@example.test").is_ok());
        assert!(email("email", "ada@").is_err());
        assert!(email("email", "ada.example.test").is_err());
        assert!(email("email", "a da@example.test").is_err());
    }

    #[test]
    fn http_url_requires_scheme_and_host() {
        assert!(http_url("url", "https://hooks.example.test/in").is_ok());
        assert!(http_url("url", "ftp://example.test").is_err());
        assert!(http_url("url", "https:///path").is_err());
        assert!(http_url("url", "  http://localhost:8080/hook ").is_ok());
        assert!(http_url("url", "https://exa mple.test/in").is_err());
        assert!(http_url("url", "https://:::::").is_err());
        assert!(http_url("url", "http://[not-an-ip").is_err());
        assert!(http_url("url", "https://host:99999999/x").is_err());
        assert!(http_url("url", "mailto:ops@example.test").is_err());
    }

    #[test]
    fn phone_counts_digits() {
        assert!(phone("phone", "+1 (555) 010-9999").is_ok());
        assert!(phone("phone", "12").is_err());
        assert!(phone("phone", "555-CALL-NOW").is_err());
    }

    #[test]
    fn max_length_counts_chars_not_bytes() {
        assert!(max_length("name", "ééé", 3).is_ok());
        assert!(max_length("name", "éééé", 3).is_err());
    }
}
