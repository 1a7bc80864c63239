//! Playlist/upload CRUD is out of scope. The routes are reserved under
//! the `authenticated` gate so the gating behavior itself is demonstrable
//! without the CRUD surface existing.

use axum::http::StatusCode;

pub async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}
