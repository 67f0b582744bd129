use url::Url;

use crate::error::{MonitorError, Result};

/// Allowed range for a site's check frequency, in seconds
pub const MIN_CHECK_FREQUENCY: u32 = 300;
pub const MAX_CHECK_FREQUENCY: u32 = 3600;

/// Validation results with specific error messages
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(msg.into()) }
    }

    pub fn to_result(&self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(MonitorError::validation(self.error.clone().unwrap_or_else(|| "Validation failed".to_string())))
        }
    }
}

/// Validate HTTP/HTTPS URL endpoint
pub fn validate_http_endpoint(target: &str) -> ValidationResult {
    if target.trim().is_empty() {
        return ValidationResult::err("URL cannot be empty");
    }

    match Url::parse(target) {
        Ok(url) => {
            let scheme = url.scheme();
            if scheme != "http" && scheme != "https" {
                return ValidationResult::err(format!("Invalid scheme '{scheme}'. Must be http or https"));
            }

            if url.host_str().is_none_or(str::is_empty) {
                return ValidationResult::err("URL must have a valid host");
            }

            ValidationResult::ok()
        }
        Err(e) => {
            // If it fails to parse, check if it's missing a scheme
            if !target.contains("://") {
                ValidationResult::err("URL must include scheme (http:// or https://)")
            } else {
                ValidationResult::err(format!("Invalid URL: {e}"))
            }
        }
    }
}

/// Validate site name
pub fn validate_site_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return ValidationResult::err("Name cannot be empty");
    }

    if trimmed.len() > 100 {
        return ValidationResult::err("Name too long (max 100 characters)");
    }

    ValidationResult::ok()
}

/// Validate check frequency
pub fn validate_check_frequency(seconds: u32) -> ValidationResult {
    if !(MIN_CHECK_FREQUENCY..=MAX_CHECK_FREQUENCY).contains(&seconds) {
        return ValidationResult::err(format!(
            "Check frequency must be between {MIN_CHECK_FREQUENCY} and {MAX_CHECK_FREQUENCY} seconds"
        ));
    }

    ValidationResult::ok()
}

/// Validate change threshold percentage
pub fn validate_change_threshold(threshold: f64) -> ValidationResult {
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return ValidationResult::err("Change threshold must be between 0 and 100");
    }

    ValidationResult::ok()
}

/// Validate a notification email address.
///
/// Deliberately shallow: one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(address: &str) -> ValidationResult {
    let Some((local, domain)) = address.trim().split_once('@') else {
        return ValidationResult::err(format!("Invalid email address: {address}"));
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
        && !domain.chars().any(char::is_whitespace);

    if local.is_empty() || local.chars().any(char::is_whitespace) || !domain_ok {
        return ValidationResult::err(format!("Invalid email address: {address}"));
    }

    ValidationResult::ok()
}
