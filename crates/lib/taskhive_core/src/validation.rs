//! Input validation helpers.
//!
//! Each helper records messages into a [`FieldErrors`] so callers can report
//! every bad field at once instead of failing on the first.

use crate::error::FieldErrors;

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest subdomain accepted (one DNS label).
pub const MAX_SUBDOMAIN_LEN: usize = 63;

/// Require a non-blank value.
pub fn require(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "Required");
    }
}

/// Require a well-formed email address.
pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !is_email(value.trim()) {
        errors.add(field, "Invalid email");
    }
}

/// Require a subdomain made of ASCII letters, digits and hyphens.
pub fn subdomain(errors: &mut FieldErrors, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "Required");
        return;
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        errors.add(
            field,
            "Subdomain may only contain letters, numbers and hyphens",
        );
    }
    if value.len() > MAX_SUBDOMAIN_LEN {
        errors.add(
            field,
            format!("Subdomain must be at most {MAX_SUBDOMAIN_LEN} characters"),
        );
    }
}

/// Require a password of at least [`MIN_PASSWORD_LEN`] characters.
pub fn new_password(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}

/// Lowercase + trim; used for emails and subdomains before storage or lookup.
pub fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
