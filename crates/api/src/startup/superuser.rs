//! One-time administrative account bootstrap.
//!
//! Runs only when a username, password and email are all provided. An
//! account with the same username is left untouched, so restarting a
//! container with the same environment is harmless.

use std::fmt;

use ccw_core::error::CoreError;
use ccw_core::types::DbId;
use ccw_db::models::user::CreateUser;
use ccw_db::repositories::UserRepo;
use ccw_db::DbPool;
use validator::Validate;

use crate::auth::password::hash_password;

/// Variable prefixes checked in order; the first non-empty value wins.
const PREFIXES: [&str; 2] = ["SUPERUSER_", "DJANGO_SUPERUSER_"];

/// Credentials for the bootstrap account.
#[derive(Clone, Validate)]
pub struct SuperuserSpec {
    #[validate(length(min = 1, max = 150, message = "must be 1-150 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SuperuserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserSpec")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SuperuserSpec {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the account from `SUPERUSER_{USERNAME,PASSWORD,EMAIL}`, falling back
    /// to the `DJANGO_SUPERUSER_*` names per field.
    ///
    /// Returns `None` unless all three resolve to non-empty values.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |field: &str| {
            PREFIXES.iter().find_map(|prefix| {
                lookup(&format!("{prefix}{field}")).filter(|v| !v.trim().is_empty())
            })
        };

        Some(Self {
            username: pick("USERNAME")?.trim().to_string(),
            email: pick("EMAIL")?.trim().to_string(),
            password: pick("PASSWORD")?,
        })
    }
}

/// What the bootstrap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(DbId),
    AlreadyExists,
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum SuperuserError {
    #[error("Invalid superuser settings: {0}")]
    Invalid(#[from] CoreError),

    #[error("Failed to hash superuser password: {0}")]
    Hash(String),

    #[error("Failed to create superuser: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the superuser described by `spec`, if any.
pub async fn ensure_superuser(
    pool: &DbPool,
    spec: Option<&SuperuserSpec>,
) -> Result<BootstrapOutcome, SuperuserError> {
    let Some(spec) = spec else {
        tracing::info!("Superuser credentials not fully provided, skipping creation");
        return Ok(BootstrapOutcome::Skipped);
    };

    spec.validate().map_err(CoreError::from)?;

    let password_hash =
        hash_password(&spec.password).map_err(|e| SuperuserError::Hash(e.to_string()))?;

    let input = CreateUser {
        username: spec.username.clone(),
        email: spec.email.clone(),
        password_hash,
        is_staff: true,
        is_superuser: true,
    };

    match UserRepo::create_if_absent(pool, &input).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "Superuser created");
            Ok(BootstrapOutcome::Created(user.id))
        }
        None => {
            tracing::warn!(
                username = %spec.username,
                "A user with the superuser username already exists, leaving it unchanged"
            );
            Ok(BootstrapOutcome::AlreadyExists)
        }
    }
}
