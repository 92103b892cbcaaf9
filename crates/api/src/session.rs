//! Session resolution boundary.
//!
//! Stands in for the out-of-scope authentication subsystem: a session is
//! registered with an already-resolved identity and addressed by an opaque
//! token. Cookie/transport mechanics never reach the core; handlers resolve
//! the `x-session-token` header against this registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::HeaderMap;
use domain::Identity;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// In-memory session registry mapping tokens to resolved identities.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Identity>>>,
}

impl SessionStore {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity and returns its fresh session token.
    pub fn create(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap()
            .insert(token.clone(), identity);
        token
    }

    /// Resolves a token to its identity.
    pub fn resolve(&self, token: &str) -> Option<Identity> {
        self.sessions.read().unwrap().get(token).cloned()
    }

    /// Drops a session.
    pub fn remove(&self, token: &str) {
        self.sessions.write().unwrap().remove(token);
    }
}

/// Extracts the session token from the request headers.
pub fn session_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)
}

/// Resolves the request's identity or fails with 401.
pub fn resolve_identity(sessions: &SessionStore, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = session_token(headers)?;
    sessions.resolve(token).ok_or(ApiError::Unauthenticated)
}
