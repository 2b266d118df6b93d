//! Input validation for all HTTP request handlers.
//!
//! Each `check_*` function appends at most one [`FieldError`] to the caller's
//! accumulator; [`finish`] turns a non-empty accumulator into
//! [`ApiError::Validation`] so a single response reports every bad field.
//!
//! ## Constraints enforced
//!
//! | Field       | Constraint                               |
//! |-------------|------------------------------------------|
//! | name        | non-blank after trim, ≤ 100 chars        |
//! | description | ≤ 500 chars                              |
//! | text        | non-blank after trim, ≤ 2000 chars       |
//! | color       | `#RRGGBB` (hash + exactly 6 hex digits)  |

use crate::error::{ApiError, FieldError};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Maximum length of any `name` field (characters).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of any `description` field (characters).
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a specificity `text` (characters).
pub const MAX_TEXT_LEN: usize = 2_000;

// ── Checks ────────────────────────────────────────────────────────────────────

/// Required name: non-blank, at most [`MAX_NAME_LEN`] characters.
pub fn check_name(errors: &mut Vec<FieldError>, field: &'static str, name: &str) {
    if name.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            field,
            format!("exceeds maximum length of {MAX_NAME_LEN} characters"),
        ));
    }
}

/// Optional description: at most [`MAX_DESCRIPTION_LEN`] characters.
pub fn check_description(errors: &mut Vec<FieldError>, description: Option<&str>) {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(FieldError::new(
                "description",
                format!("exceeds maximum length of {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
    }
}

/// Required specificity text: non-blank, at most [`MAX_TEXT_LEN`] characters.
pub fn check_text(errors: &mut Vec<FieldError>, text: &str) {
    if text.trim().is_empty() {
        errors.push(FieldError::new("text", "must not be empty"));
    } else if text.chars().count() > MAX_TEXT_LEN {
        errors.push(FieldError::new(
            "text",
            format!("exceeds maximum length of {MAX_TEXT_LEN} characters"),
        ));
    }
}

/// Required color: `#` followed by exactly six hex digits.
pub fn check_color(errors: &mut Vec<FieldError>, color: &str) {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        errors.push(FieldError::new(
            "color",
            format!("must be a #RRGGBB hex string, got {color:?}"),
        ));
    }
}

/// Consumes the accumulator: `Ok(())` when empty, 400 payload otherwise.
pub fn finish(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
