//! Shared request validation helpers.
//!
//! Field-level rules used by more than one domain module, plus a flattener
//! that turns `validator` derive output into a single human-readable line.

use crate::error::CoreError;

/// Validate a required, length-bounded text field.
///
/// Rejects values that are empty after trimming or longer than `max_len`
/// characters. Returns a `CoreError::Validation` naming the field.
pub fn validate_bounded_text(value: &str, field: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters, got {len}"
        )));
    }
    Ok(())
}

/// Flatten `validator` errors into `"field: message; field: message"`.
///
/// Fields are sorted so the output is stable across runs.
pub fn describe_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {message}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
