//! Route definitions for the `/json-data` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::json_data;
use crate::state::AppState;

/// Routes mounted at `/json-data`. Every route requires authentication and
/// only ever sees the caller's own documents.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /names               -> names
/// GET    /{id}                -> get
/// PUT    /{id}                -> replace
/// PATCH  /{id}                -> patch
/// DELETE /{id}                -> delete
/// POST   /{id}/make-public    -> make_public
/// POST   /{id}/make-private   -> make_private
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(json_data::list).post(json_data::create))
        .route("/names", get(json_data::names))
        .route(
            "/{id}",
            get(json_data::get)
                .put(json_data::replace)
                .patch(json_data::patch)
                .delete(json_data::delete),
        )
        .route("/{id}/make-public", post(json_data::make_public))
        .route("/{id}/make-private", post(json_data::make_private))
}
