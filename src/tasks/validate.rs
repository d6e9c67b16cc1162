//! Field validators.
//!
//! Each validator trims its input and either returns the normalized value or
//! fails with an error describing what the user should enter instead.

use crate::error::{Error, Result};
use crate::tasks::models::{Priority, Status};

/// Maximum title length, in characters, after trimming.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length, in characters, after trimming.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Validate a task title, returning it trimmed.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] if the title is empty or longer than
/// [`MAX_TITLE_LEN`] characters.
pub fn validate_title(raw: &str) -> Result<String> {
    validate_text("Title", raw, MAX_TITLE_LEN)
}

/// Validate a task description, returning it trimmed.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] if the description is empty or longer
/// than [`MAX_DESCRIPTION_LEN`] characters.
pub fn validate_description(raw: &str) -> Result<String> {
    validate_text("Description", raw, MAX_DESCRIPTION_LEN)
}

fn validate_text(field: &'static str, raw: &str, max_len: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidField { field, reason: "cannot be empty".to_string() });
    }
    if trimmed.chars().count() > max_len {
        return Err(Error::InvalidField {
            field,
            reason: format!("cannot be longer than {max_len} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Validate a priority, accepting any letter case.
///
/// # Errors
///
/// Returns [`Error::InvalidEnum`] listing the three priorities if the input
/// is not one of them.
pub fn validate_priority(raw: &str) -> Result<Priority> {
    let normalized = capitalize(raw.trim());
    Priority::from_canonical(&normalized).ok_or_else(|| Error::InvalidEnum {
        field: "Priority",
        value: raw.to_string(),
        allowed: &Priority::NAMES,
    })
}

/// Validate a status, accepting any letter case.
///
/// "In Progress" is matched as two words regardless of case or of how much
/// whitespace separates them.
///
/// # Errors
///
/// Returns [`Error::InvalidEnum`] listing the three statuses if the input is
/// not one of them.
pub fn validate_status(raw: &str) -> Result<Status> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.join(" ").to_lowercase() == "in progress" {
        return Ok(Status::InProgress);
    }

    let normalized = capitalize(raw.trim());
    match Status::from_canonical(&normalized) {
        Some(status @ (Status::Pending | Status::Completed)) => Ok(status),
        _ => Err(Error::InvalidEnum { field: "Status", value: raw.to_string(), allowed: &Status::NAMES }),
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
