//! `{ "data": ... }` envelope used by every resource endpoint.
//!
//! Auth endpoints (login, refresh, me) answer with bare objects instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Enveloped JSON body answered with 200 OK.
pub type Envelope<T> = Json<DataResponse<T>>;

pub fn ok<T: Serialize>(data: T) -> Envelope<T> {
    Json(DataResponse { data })
}

/// Enveloped body answered with 201 Created.
#[derive(Debug)]
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, ok(self.0)).into_response()
    }
}
