//! Standard string validations
//!
//! Options: `min` and `max` bound the length in characters, `pattern` is a
//! regular expression the value must match and `replace` is substituted for
//! every `pattern` match when sanitizing.

use std::iter;

use regex::Regex;
use serde_json::Value;

use crate::{
    descriptor::{FilterSpec, Registration},
    errors::FilterFailure,
    options::{OptionSchema, OptionSpec, ResolvedOptions},
};

pub const DESCRIPTION: &str = "Standard string validations";

#[must_use]
pub fn options() -> OptionSchema {
    OptionSchema::new()
        .with("min", OptionSpec::with_default(0).description("Minimum length"))
        .with("max", OptionSpec::new().description("Maximum length"))
        .with(
            "pattern",
            OptionSpec::new().description("Regexp that should be matched"),
        )
        .with(
            "replace",
            OptionSpec::new()
                .description("Replacement for given pattern, used for sanitization only"),
        )
}

#[must_use]
pub fn registration() -> Registration {
    FilterSpec::new()
        .description(DESCRIPTION)
        .validate(validate)
        .sanitize(sanitize)
        .options(options())
        .into()
}

/// # Errors
/// When the value is not a string, violates a length bound or does not match
/// the pattern.
pub fn validate(value: &Value, options: &ResolvedOptions) -> Result<(), FilterFailure> {
    let value = expect_string(value)?;
    let length = value.chars().count();

    if let Some(min) = length_option(options, "min")? {
        if length < min {
            return Err(format!("String should be at least {min} characters long").into());
        }
    }
    if let Some(max) = length_option(options, "max")? {
        if length > max {
            return Err(format!("String should be at most {max} characters long").into());
        }
    }
    if let Some(pattern) = pattern_option(options)? {
        if !pattern.is_match(value) {
            return Err(format!("String should match pattern {}", pattern.as_str()).into());
        }
    }
    Ok(())
}

/// # Errors
/// When the value is not a string or an option is malformed.
pub fn sanitize(value: &Value, options: &ResolvedOptions) -> Result<Value, FilterFailure> {
    let mut value = expect_string(value)?.to_string();

    if let (Some(pattern), Some(replace)) = (pattern_option(options)?, options.get_str("replace")) {
        value = pattern.replace_all(&value, replace).into_owned();
    }
    if let Some(min) = length_option(options, "min")? {
        let length = value.chars().count();
        if length < min {
            value.extend(iter::repeat(' ').take(min - length));
        }
    }
    if let Some(max) = length_option(options, "max")? {
        if value.chars().count() > max {
            value = value.chars().take(max).collect();
        }
    }

    Ok(Value::String(value))
}

fn expect_string(value: &Value) -> Result<&str, FilterFailure> {
    value
        .as_str()
        .ok_or_else(|| FilterFailure::new("String expected"))
}

fn length_option(options: &ResolvedOptions, name: &str) -> Result<Option<usize>, FilterFailure> {
    match options.get(name) {
        Value::Null => Ok(None),
        value => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                FilterFailure::new(format!("Option {name} should be a non-negative integer"))
            }),
    }
}

fn pattern_option(options: &ResolvedOptions) -> Result<Option<Regex>, FilterFailure> {
    match options.get("pattern") {
        Value::Null => Ok(None),
        Value::String(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|e| FilterFailure::new(format!("Invalid pattern {pattern}: {e}"))),
        _ => Err(FilterFailure::new("Option pattern should be a string")),
    }
}
