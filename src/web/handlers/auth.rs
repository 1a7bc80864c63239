//! `POST /auth/login`: a demo stub issuing a bearer JWT against an
//! in-memory user table. This repo does not own user storage.

use crate::errors::{AuthError, GatewayResult};
use crate::web::AppState;
use crate::web::responses::LoginResponse;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;

/// In-memory demo credentials; real user storage is explicitly out of scope.
const DEMO_USERS: &[(&str, &str)] = &[("demo", "demo-password"), ("guest", "guest-password")];

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> GatewayResult<Json<LoginResponse>> {
    let valid = DEMO_USERS
        .iter()
        .any(|(user, pass)| *user == request.username && *pass == request.password);

    if !valid {
        // Login failure is a 401, not the 400 a bad-request validation
        // error would produce.
        return Err(AuthError::MissingToken.into());
    }

    let token = state.auth.issue_token(&request.username, vec!["user".to_string()])?;
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in: state.auth.expiration_secs(),
    }))
}
