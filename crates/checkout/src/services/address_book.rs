//! Address book trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::CheckoutError;

/// How many address slots a customer profile carries.
pub const ADDRESS_SLOTS: usize = 4;

/// Trait for looking up a customer's registered delivery addresses.
///
/// The profile subsystem owns the slots; the checkout flow only reads the
/// non-blank ones to validate the selected address.
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Returns the customer's non-blank address slots, at most
    /// [`ADDRESS_SLOTS`] of them.
    async fn addresses(&self, username: &str) -> Result<Vec<String>, CheckoutError>;
}

/// In-memory address book for testing and standalone runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressBook {
    state: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryAddressBook {
    /// Creates a new empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer's address slots, keeping the first
    /// [`ADDRESS_SLOTS`] entries.
    pub fn set_addresses(&self, username: impl Into<String>, addresses: Vec<String>) {
        let mut slots = addresses;
        slots.truncate(ADDRESS_SLOTS);
        self.state.write().unwrap().insert(username.into(), slots);
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn addresses(&self, username: &str) -> Result<Vec<String>, CheckoutError> {
        let state = self.state.read().unwrap();
        Ok(state
            .get(username)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|a| !a.trim().is_empty())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
