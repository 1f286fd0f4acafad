//! Input checks run before a request leaves the client

use regex::Regex;
use std::{path::Path, sync::OnceLock};
use thiserror::Error;

/// Longest accepted video description, in words
pub const MAX_DESCRIPTION_WORDS: usize = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("Description must be at most 30 words (got {0})")]
    DescriptionTooLong(usize),
    #[error("Cannot tell the content type of {0}")]
    UnknownFileType(String),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    })
}

pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::Missing(field))
    } else {
        Ok(value)
    }
}

pub fn check_email(email: &str) -> Result<(), FormError> {
    if email_pattern().is_match(email) {
        Ok(())
    } else {
        Err(FormError::InvalidEmail(email.to_string()))
    }
}

pub fn check_description(description: &str) -> Result<(), FormError> {
    let words = description.split_whitespace().count();
    if words > MAX_DESCRIPTION_WORDS {
        return Err(FormError::DescriptionTooLong(words));
    }
    Ok(())
}

/// MIME type for an upload, from its extension
pub fn content_type_for(path: &Path) -> Result<&'static str, FormError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("mp4") => Ok("video/mp4"),
        _ => Err(FormError::UnknownFileType(path.display().to_string())),
    }
}
