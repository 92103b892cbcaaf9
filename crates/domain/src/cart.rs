//! The session-owned shopping cart.

use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::product::Product;

/// Errors raised by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Requested more units than the live stock allows, counting what is
    /// already in the cart.
    #[error("Not enough stock for {product_name}: only {remaining} more can be added")]
    InsufficientStock {
        product_name: String,
        remaining: u32,
    },
}

/// One product + quantity entry in a cart.
///
/// Name and price are snapshots of the product at the time of adding; the
/// checkout transaction re-freezes both from the live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub product_id: ProductId,

    /// Product name at the time of adding.
    pub product_name: String,

    /// Unit price at the time of adding.
    pub unit_price: Money,

    /// Units requested, always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Returns the total price for this line (quantity * unit price).
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An ephemeral, session-owned collection of cart lines.
///
/// The cart is never persisted durably: it is deserialized from its session
/// snapshot on every request and re-serialized after every mutation. At most
/// one line exists per product; adding the same product again merges into
/// the existing line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cart lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true if the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the total quantity across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Returns the quantity already in the cart for a product.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Returns the cart total.
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.total())
    }

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// The stock check is advisory: it compares the combined quantity
    /// against the product's live stock at this moment, and checkout
    /// re-validates under lock.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let in_cart = self.quantity_of(product.id);
        let requested = in_cart + quantity;
        if !product.has_stock_for(requested) {
            return Err(CartError::InsufficientStock {
                product_name: product.name.clone(),
                remaining: product.remaining_after(in_cart),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = requested;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity,
            });
        }
        Ok(())
    }

    /// Removes the line for a product. Returns true if a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
