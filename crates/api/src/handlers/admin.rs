//! Handlers for the `/admin` resource.
//!
//! All handlers require a staff account via [`RequireStaff`].

use axum::extract::{Query, State};
use ccw_core::search::split_terms;
use ccw_core::types::DbId;
use ccw_db::models::json_data::{AdminJsonDataQuery, JsonDataResponse};
use ccw_db::models::tnc_acceptance::TncAcceptance;
use ccw_db::models::user::UserResponse;
use ccw_db::repositories::{JsonDataRepo, TncAcceptanceRepo, UserRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::{ok, Envelope};
use crate::state::AppState;

/// Query parameters for `GET /admin/json-data`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminJsonDataParams {
    pub user_id: Option<DbId>,
    /// Terms matched against document name or owner username.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /admin/tnc-acceptances`.
#[derive(Debug, Default, Deserialize)]
pub struct TncListParams {
    pub config_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
) -> AppResult<Envelope<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(ok(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/admin/json-data
///
/// Every user's documents, most recently updated first.
pub async fn list_json_data(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(params): Query<AdminJsonDataParams>,
) -> AppResult<Envelope<Vec<JsonDataResponse>>> {
    let query = AdminJsonDataQuery {
        user_id: params.user_id,
        search_terms: params.search.as_deref().map(split_terms).unwrap_or_default(),
        limit: params.limit,
        offset: params.offset,
    };
    let rows = JsonDataRepo::list_all(&state.pool, &query).await?;
    Ok(ok(rows.into_iter().map(JsonDataResponse::from).collect()))
}

/// GET /api/admin/tnc-acceptances
pub async fn list_tnc_acceptances(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(params): Query<TncListParams>,
) -> AppResult<Envelope<Vec<TncAcceptance>>> {
    let config_id = params.config_id.as_deref().filter(|c| !c.is_empty());
    let rows =
        TncAcceptanceRepo::list(&state.pool, config_id, params.limit, params.offset).await?;
    Ok(ok(rows))
}
