//! Session cart snapshot storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Cart;

use crate::error::CheckoutError;

/// Trait for the injected session cart capability.
///
/// The cart is never held in server memory between requests as a live
/// object: it is stored as a serialized snapshot keyed by session token,
/// reloaded on every request and re-saved after every mutation. The
/// transport (cookies, session middleware) stays outside this boundary.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the cart snapshot for a session; an empty cart if none exists.
    async fn load(&self, session: &str) -> Result<Cart, CheckoutError>;

    /// Persists the cart snapshot for a session.
    async fn save(&self, session: &str, cart: &Cart) -> Result<(), CheckoutError>;

    /// Drops the session's cart snapshot.
    async fn clear(&self, session: &str) -> Result<(), CheckoutError>;
}

/// In-memory cart store holding JSON snapshots, for tests and standalone
/// runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    snapshots: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().unwrap().len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, session: &str) -> Result<Cart, CheckoutError> {
        let snapshots = self.snapshots.read().unwrap();
        match snapshots.get(session) {
            Some(json) => {
                serde_json::from_str(json).map_err(|e| CheckoutError::Session(e.to_string()))
            }
            None => Ok(Cart::new()),
        }
    }

    async fn save(&self, session: &str, cart: &Cart) -> Result<(), CheckoutError> {
        let json =
            serde_json::to_string(cart).map_err(|e| CheckoutError::Session(e.to_string()))?;
        self.snapshots
            .write()
            .unwrap()
            .insert(session.to_string(), json);
        Ok(())
    }

    async fn clear(&self, session: &str) -> Result<(), CheckoutError> {
        self.snapshots.write().unwrap().remove(session);
        Ok(())
    }
}
