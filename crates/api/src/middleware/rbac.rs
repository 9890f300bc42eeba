//! Staff-only gate for the admin endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated caller whose token carries the staff flag.
///
/// Missing or invalid tokens reject with 401 (via [`AuthUser`]); valid
/// non-staff tokens reject with 403.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

impl TryFrom<AuthUser> for RequireStaff {
    type Error = AppError;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        if user.staff {
            Ok(Self(user))
        } else {
            Err(AppError::forbidden("Staff access required"))
        }
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let user_id = user.user_id;
        RequireStaff::try_from(user).inspect_err(|_| {
            tracing::warn!(
                target: "security",
                user_id,
                path = %parts.uri.path(),
                "Non-staff user attempted admin access"
            );
        })
    }
}
