use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors};

lazy_static! {
    pub static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Human label for a field: `prep_time` reads as "prep time".
pub fn label(field: &str) -> String {
    field.replace('_', " ")
}

pub fn field_error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

pub fn required(field: &str) -> ValidationError {
    field_error("required", format!("The {} field is required.", label(field)))
}

pub fn not_integer(field: &str) -> ValidationError {
    field_error("integer", format!("The {} field must be an integer.", label(field)))
}

pub fn below_zero(field: &str) -> ValidationError {
    field_error("min", format!("The {} field must be at least 0.", label(field)))
}

/// Postgres TEXT cannot store NUL.
pub fn has_nul(field: &str) -> ValidationError {
    field_error(
        "string",
        format!("The {} field must not contain NUL characters.", label(field)),
    )
}

/// A one-field error set, for checks that happen outside a struct validator.
pub fn single(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

/// Integers arrive as JSON numbers or as digit strings from query strings and forms.
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Trims a string field and treats blank input as absent.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
