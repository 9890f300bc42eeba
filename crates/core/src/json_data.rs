//! Rules for per-user JSON documents.

use crate::error::CoreError;
use crate::ordering::{Direction, OrderField, OrderTerm};
use crate::validation::validate_bounded_text;

/// Maximum length of a document name.
pub const NAME_MAX_LEN: usize = 255;

/// Fields a document listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDataOrderField {
    Name,
    CreatedAt,
    UpdatedAt,
}

impl OrderField for JsonDataOrderField {
    fn from_param(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Name => "j.name",
            Self::CreatedAt => "j.created_at",
            Self::UpdatedAt => "j.updated_at",
        }
    }
}

/// Most recently updated first.
pub const DEFAULT_ORDERING: [OrderTerm<JsonDataOrderField>; 1] = [OrderTerm {
    field: JsonDataOrderField::UpdatedAt,
    direction: Direction::Desc,
}];

/// Validate a document name (non-blank, at most [`NAME_MAX_LEN`] characters).
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    validate_bounded_text(name, "name", NAME_MAX_LEN)
}

/// Validate a document payload. Any JSON value is accepted except `null`.
pub fn validate_data(data: &serde_json::Value) -> Result<(), CoreError> {
    if data.is_null() {
        return Err(CoreError::Validation("data must not be null".into()));
    }
    Ok(())
}
