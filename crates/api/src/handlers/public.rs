//! Unauthenticated read access to documents shared by UUID.

use axum::extract::{Path, State};
use ccw_core::error::CoreError;
use ccw_db::models::json_data::PublicJsonData;
use ccw_db::repositories::JsonDataRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::{ok, Envelope};
use crate::state::AppState;

/// GET /api/public/json-data/{uuid}
///
/// Private and missing documents are indistinguishable (both 404).
pub async fn get_json_data(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> AppResult<Envelope<PublicJsonData>> {
    let doc = JsonDataRepo::find_public_by_uuid(&state.pool, uuid)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByKey {
                entity: "JsonData",
                key: uuid.to_string(),
            })
        })?;
    Ok(ok(doc))
}
