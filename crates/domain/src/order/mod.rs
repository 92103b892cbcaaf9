//! The persisted order aggregate and its lifecycle rules.

mod status;

pub use status::OrderStatus;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLine;
use crate::identity::Identity;
use crate::money::Money;

/// Errors raised by order lifecycle transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The transition is not legal from the order's current status.
    #[error("Cannot {action} an order in {status} status")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
    },

    /// A customer tried to act on an order they do not own.
    #[error("Order does not belong to the requesting customer")]
    NotOwner,

    /// The admin override was asked to set an unrecognized status.
    #[error("Unrecognized order status: {status}")]
    UnrecognizedStatus { status: String },
}

/// One line of a persisted order.
///
/// Name and price are frozen at checkout time and never re-derived from the
/// live product, so the record stays accurate if the product is later edited
/// or deactivated. The product id is kept only for detail lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Weak reference to the ordered product.
    pub product_id: ProductId,

    /// Product name at checkout time.
    pub product_name: String,

    /// Unit price at checkout time.
    pub unit_price: Money,

    /// Units ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the total price for this item.
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A persisted order.
///
/// Creation fields are immutable once the checkout transaction commits;
/// only status, the admin comment, and the audit flags change afterwards.
/// Orders are soft-deleted, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, assigned at checkout.
    pub id: OrderId,

    /// Customer display name at checkout time.
    pub customer_name: String,

    /// Customer login name; the ownership key.
    pub username: String,

    /// Customer email at checkout time.
    pub email: String,

    /// The delivery address chosen at checkout.
    pub delivery_address: String,

    /// Server-assigned UTC timestamp of the checkout.
    pub placed_at: DateTime<Utc>,

    /// Snapshotted line items.
    pub items: Vec<OrderItem>,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Free-text comment recorded by the admin override.
    pub admin_comment: Option<String>,

    /// Set when an admin cancelled the order.
    pub cancelled_by_admin: bool,

    /// Set when the owning customer cancelled the order.
    pub cancelled_by_customer: bool,

    /// Soft-delete marker; hidden from reports, kept for audit.
    pub deleted: bool,
}

impl Order {
    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.total())
    }

    /// Returns true if `username` placed this order.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }

    /// Cancels the order on behalf of `actor`.
    ///
    /// Legal only from `Pending`. Customers must own the order; admins may
    /// cancel any pending order. Sets the matching cancelled-by flag.
    pub fn cancel(&mut self, actor: &Identity) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidState {
                status: self.status,
                action: "cancel",
            });
        }

        if actor.is_admin() {
            self.cancelled_by_admin = true;
        } else {
            if !self.is_owned_by(&actor.username) {
                return Err(OrderError::NotOwner);
            }
            self.cancelled_by_customer = true;
        }

        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Approves the order. Legal only from `Pending`.
    ///
    /// Approval is a pure status transition: stock was already debited when
    /// the order was placed.
    pub fn approve(&mut self) -> Result<(), OrderError> {
        if !self.status.can_approve() {
            return Err(OrderError::InvalidState {
                status: self.status,
                action: "approve",
            });
        }
        self.status = OrderStatus::Approved;
        Ok(())
    }

    /// Admin override: sets any recognized status from any prior state and
    /// records the comment. Rejects `Unknown`.
    pub fn set_status(
        &mut self,
        status: OrderStatus,
        comment: Option<String>,
    ) -> Result<(), OrderError> {
        if !status.is_recognized() {
            return Err(OrderError::UnrecognizedStatus {
                status: status.to_string(),
            });
        }
        self.status = status;
        self.admin_comment = comment;
        Ok(())
    }

    /// Marks the order soft-deleted. Legal only from `Rejected` or
    /// `Completed`.
    pub fn soft_delete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_delete() {
            return Err(OrderError::InvalidState {
                status: self.status,
                action: "delete",
            });
        }
        self.deleted = true;
        Ok(())
    }
}

/// Checkout input: who is ordering what, to where.
///
/// Carries (product, quantity) intent from the cart; the store freezes the
/// authoritative name/price from the locked product rows when it builds the
/// order, so the cart's snapshots are only used for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// The ordering customer.
    pub customer: Identity,

    /// Chosen delivery address.
    pub delivery_address: String,

    /// The cart lines to convert.
    pub lines: Vec<CartLine>,
}

impl OrderDraft {
    /// Builds a draft from a cart.
    pub fn from_cart(
        customer: Identity,
        delivery_address: impl Into<String>,
        lines: &[CartLine],
    ) -> Self {
        Self {
            customer,
            delivery_address: delivery_address.into(),
            lines: lines.to_vec(),
        }
    }
}
