//! Domain errors. HTTP mapping lives in the API crate.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a non-numeric key such as a share UUID. The key is kept
    /// for logs only and never echoed to the caller.
    #[error("{entity} not found")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

impl CoreError {
    /// Stable machine-readable code rendered next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } | CoreError::NotFoundByKey { .. } => "NOT_FOUND",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Unauthorized(_) => "UNAUTHORIZED",
            CoreError::Forbidden(_) => "FORBIDDEN",
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(crate::validation::describe_errors(&errors))
    }
}
