//! `/auth` routes. Login and refresh are open; logout and `me` need a
//! bearer token, which their extractors enforce.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let open = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let signed_in = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    open.merge(signed_in)
}
