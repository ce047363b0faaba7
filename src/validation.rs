//! Field-rule evaluation shared by the identity and task flows.
//!
//! Each request type declares its rules statically through `#[derive(Validate)]`
//! attributes. This module supplies the custom predicates those declarations
//! reference and turns a `validator::ValidationErrors` value into the
//! field → ordered messages map returned to clients.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;
use crate::models::TaskPriority;

/// Field name → ordered list of human-readable violation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const PASSWORD_STRENGTH_MESSAGE: &str = "Password must contain at least one uppercase letter, \
     one lowercase letter, one number, and one special character";

pub const PRIORITY_MESSAGE: &str = "Priority must be one of: high, medium, low";

lazy_static::lazy_static! {
    static ref UPPERCASE: Regex = Regex::new(r"\p{Lu}").unwrap();
    static ref LOWERCASE: Regex = Regex::new(r"\p{Ll}").unwrap();
    static ref DIGIT: Regex = Regex::new(r"\p{Nd}").unwrap();
    static ref PUNCTUATION_OR_SYMBOL: Regex = Regex::new(r"[\p{P}\p{S}]").unwrap();
}

/// Runs the payload's declared rules.
///
/// Returns `AppError::ValidationFailed` carrying the field map when any rule fails.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

/// Flattens `validator` output into the client-facing field map.
///
/// Rules that carry no explicit message fall back to their rule code so that no
/// violation is ever dropped silently.
pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, violations) in errors.field_errors() {
        let messages = violations
            .iter()
            .map(|violation| match &violation.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid ({})", field, violation.code),
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }
    fields
}

/// Adds one message to a field, keeping earlier messages first.
pub fn push_message(fields: &mut FieldErrors, field: &str, message: impl Into<String>) {
    fields
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// True when the candidate contains an upper-case letter, a lower-case letter,
/// a decimal digit and a punctuation or symbol character.
///
/// Length is checked by a separate rule so the two failures produce distinct messages.
pub fn is_strong_password(candidate: &str) -> bool {
    UPPERCASE.is_match(candidate)
        && LOWERCASE.is_match(candidate)
        && DIGIT.is_match(candidate)
        && PUNCTUATION_OR_SYMBOL.is_match(candidate)
}

/// Custom rule referenced by password fields.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(rule_error("password_strength", PASSWORD_STRENGTH_MESSAGE))
    }
}

/// Custom rule referenced by the task priority field.
pub fn validate_priority(priority: &str) -> Result<(), ValidationError> {
    match priority.parse::<TaskPriority>() {
        Ok(_) => Ok(()),
        Err(_) => Err(rule_error("priority", PRIORITY_MESSAGE)),
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
