//! Session registration boundary.
//!
//! Stands in for the out-of-scope authentication subsystem: callers
//! register an already-resolved identity (plus address slots) and get back
//! the opaque token the other endpoints expect in `x-session-token`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Identity;
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
}

/// POST /sessions — register a resolved identity and mint its token.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn create<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(axum::http::StatusCode, Json<SessionResponse>), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username must not be empty".to_string()));
    }

    let identity = if req.admin {
        Identity::admin(&req.username, &req.name, &req.email)
    } else {
        Identity::customer(&req.username, &req.name, &req.email)
    };

    if !req.addresses.is_empty() {
        state.address_book.set_addresses(&req.username, req.addresses);
    }

    let token = state.sessions.create(identity);
    Ok((
        axum::http::StatusCode::CREATED,
        Json(SessionResponse { token }),
    ))
}
