//! Order notification trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;

use crate::error::CheckoutError;

/// Fire-and-forget notification capability.
///
/// Invoked after a checkout commits; the coordinator spawns the call and
/// never awaits it for correctness. Delivery content and transport live
/// behind this boundary.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifies the customer that their order was placed.
    async fn order_placed(&self, email: &str, order_id: OrderId) -> Result<(), CheckoutError>;
}

/// In-memory notifier that records sent notifications, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<RwLock<Vec<(String, OrderId)>>>,
}

impl InMemoryNotifier {
    /// Creates a new notifier with an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many notifications were recorded.
    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }

    /// Returns true if a notification was recorded for the given order.
    pub fn was_notified(&self, order_id: OrderId) -> bool {
        self.sent.read().unwrap().iter().any(|(_, id)| *id == order_id)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn order_placed(&self, email: &str, order_id: OrderId) -> Result<(), CheckoutError> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), order_id));
        Ok(())
    }
}
