//! Handlers for the `/json-data` resource.
//!
//! Every handler requires [`AuthUser`] and scopes its query to the caller,
//! so another user's document looks exactly like a missing one (404).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ccw_core::error::CoreError;
use ccw_core::json_data::{validate_data, validate_name, JsonDataOrderField};
use ccw_core::ordering::parse_ordering;
use ccw_core::search::split_terms;
use ccw_core::types::DbId;
use ccw_db::models::json_data::{
    CreateJsonData, JsonDataListQuery, JsonDataResponse, JsonDataWithOwner, UpdateJsonData,
};
use ccw_db::repositories::JsonDataRepo;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{ok, Created, Envelope};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /json-data`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Whitespace/comma separated terms; each must appear in `name`.
    pub search: Option<String>,
    /// Comma separated fields, `-` prefix for descending.
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for `POST /json-data`, `PUT /json-data/{id}` and
/// `PATCH /json-data/{id}`.
///
/// Create and PUT require both fields; PATCH accepts any subset. `data` is
/// read through [`explicit`] so a literal `null` is seen (and rejected)
/// rather than mistaken for an absent field.
#[derive(Debug, Default, Deserialize)]
pub struct JsonDataBody {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub data: Option<serde_json::Value>,
}

/// Deserialize a present field as `Some(value)`, including `Some(Null)`.
fn explicit<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl JsonDataBody {
    /// Validate a body that must carry both fields. The name is stored trimmed.
    fn into_create(self) -> Result<CreateJsonData, CoreError> {
        let name = self
            .name
            .map(|name| name.trim().to_string())
            .ok_or_else(|| CoreError::Validation("name is required".into()))?;
        let data = self
            .data
            .ok_or_else(|| CoreError::Validation("data is required".into()))?;
        validate_name(&name)?;
        validate_data(&data)?;
        Ok(CreateJsonData { name, data })
    }

    /// Validate whichever fields are present.
    fn into_update(self) -> Result<UpdateJsonData, CoreError> {
        let name = self.name.map(|name| name.trim().to_string());
        if let Some(name) = &name {
            validate_name(name)?;
        }
        if let Some(data) = &self.data {
            validate_data(data)?;
        }
        Ok(UpdateJsonData {
            name,
            data: self.data,
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/json-data
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<Envelope<Vec<JsonDataResponse>>> {
    let query = JsonDataListQuery {
        search_terms: params.search.as_deref().map(split_terms).unwrap_or_default(),
        ordering: parse_ordering::<JsonDataOrderField>(params.ordering.as_deref()),
        limit: params.limit,
        offset: params.offset,
    };

    let rows = JsonDataRepo::list_for_user(&state.pool, user.user_id, &query).await?;
    Ok(ok(rows.into_iter().map(JsonDataResponse::from).collect()))
}

/// POST /api/json-data
///
/// The owner is always the caller; a `user` field in the body is ignored.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<JsonDataBody>,
) -> AppResult<Created<JsonDataResponse>> {
    let input = body.into_create()?;
    let row = JsonDataRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(user_id = user.user_id, json_data_id = row.id, "JSON data created");
    Ok(Created(row.into()))
}

/// GET /api/json-data/names
pub async fn names(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Envelope<Vec<String>>> {
    let names = JsonDataRepo::distinct_names(&state.pool, user.user_id).await?;
    Ok(ok(names))
}

/// GET /api/json-data/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<JsonDataResponse>> {
    let row = JsonDataRepo::find_for_user(&state.pool, user.user_id, id).await?;
    respond(row, id)
}

/// PUT /api/json-data/{id}
pub async fn replace(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<JsonDataBody>,
) -> AppResult<Envelope<JsonDataResponse>> {
    let full = body.into_create()?;
    let input = UpdateJsonData {
        name: Some(full.name),
        data: Some(full.data),
    };
    let row = JsonDataRepo::update(&state.pool, user.user_id, id, &input).await?;
    respond(row, id)
}

/// PATCH /api/json-data/{id}
pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<JsonDataBody>,
) -> AppResult<Envelope<JsonDataResponse>> {
    let input = body.into_update()?;
    let row = JsonDataRepo::update(&state.pool, user.user_id, id, &input).await?;
    respond(row, id)
}

/// DELETE /api/json-data/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if JsonDataRepo::delete(&state.pool, user.user_id, id).await? {
        tracing::info!(user_id = user.user_id, json_data_id = id, "JSON data deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/json-data/{id}/make-public
pub async fn make_public(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<JsonDataResponse>> {
    let row = JsonDataRepo::set_public(&state.pool, user.user_id, id, true).await?;
    respond(row, id)
}

/// POST /api/json-data/{id}/make-private
pub async fn make_private(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<JsonDataResponse>> {
    let row = JsonDataRepo::set_public(&state.pool, user.user_id, id, false).await?;
    respond(row, id)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "JsonData",
        id,
    })
}

fn respond(
    row: Option<JsonDataWithOwner>,
    id: DbId,
) -> AppResult<Envelope<JsonDataResponse>> {
    let row = row.ok_or_else(|| not_found(id))?;
    Ok(ok(row.into()))
}
