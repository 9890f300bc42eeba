use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ccw_core::error::CoreError;
use serde::Serialize;

/// Handler error. Renders as `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::Unauthorized(msg.into()))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Core(CoreError::Forbidden(msg.into()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::from(errors))
    }
}

/// Wire shape of every error body produced by this service.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl ErrorBody {
    fn internal() -> Self {
        Self {
            error: "An internal error occurred".into(),
            code: "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Core(core) => core_body(&core),
            AppError::Database(err) => database_error(err),
            AppError::BadRequest(error) => (StatusCode::BAD_REQUEST, ErrorBody {
                error,
                code: "BAD_REQUEST",
            }),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
            }
        };
        (status, Json(body)).into_response()
    }
}

fn core_body(err: &CoreError) -> (StatusCode, ErrorBody) {
    (core_status(err), ErrorBody {
        error: err.to_string(),
        code: err.code(),
    })
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound { .. } | CoreError::NotFoundByKey { .. } => StatusCode::NOT_FOUND,
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
    }
}

/// Unique violations on `uq_*` constraints become 409; anything else is
/// logged and hidden behind a generic 500.
fn database_error(err: sqlx::Error) -> (StatusCode, ErrorBody) {
    if let sqlx::Error::RowNotFound = err {
        return (StatusCode::NOT_FOUND, ErrorBody {
            error: "Resource not found".into(),
            code: "NOT_FOUND",
        });
    }

    let conflict = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint())
        .filter(|name| name.starts_with("uq_"))
        .map(|name| CoreError::Conflict(conflict_message(name)));

    match conflict {
        Some(core) => core_body(&core),
        None => {
            tracing::error!(error = %err, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_json_data_user_name" => "A JSON data entry with this name already exists".into(),
        "uq_users_username" => "A user with this username already exists".into(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
