//! Catalog products and their stock counters.

use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Errors raised when validating product input.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Product name must not be blank.
    #[error("Product name must not be empty")]
    EmptyName,

    /// Unit price must be positive.
    #[error("Invalid price: {price} cents (must be greater than 0)")]
    InvalidPrice { price: i64 },
}

/// A catalog product.
///
/// Stock lives on the product row; every debit goes through the store so the
/// counter can never go negative. Products are deactivated rather than
/// removed so historical orders keep resolving their product references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Descriptive text shown on the storefront.
    pub description: String,

    /// Category label (e.g. "Chips", "Sweets").
    pub category: String,

    /// Units currently available for sale.
    pub stock_quantity: u32,

    /// Pack weight or size label (e.g. "200g").
    pub weight_or_size: String,

    /// Packaging type (e.g. "Box", "Pouch").
    pub pack_type: String,

    /// Reference to the product image, if one was uploaded.
    pub image_path: Option<String>,

    /// Soft-delete marker; inactive products are hidden from the storefront.
    pub is_active: bool,

    /// Highlighted on the storefront landing page.
    pub is_best_seller: bool,
}

impl Product {
    /// Returns true if `quantity` units can currently be sold.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock_quantity
    }

    /// How many more units fit on top of `already_reserved` before the
    /// live stock is exhausted.
    pub fn remaining_after(&self, already_reserved: u32) -> u32 {
        self.stock_quantity.saturating_sub(already_reserved)
    }
}

/// Input for creating or updating a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category: String,
    pub stock_quantity: u32,
    pub weight_or_size: String,
    pub pack_type: String,
    pub image_path: Option<String>,
    pub is_best_seller: bool,
}

impl NewProduct {
    /// Validates the input fields.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if !self.price.is_positive() {
            return Err(ProductError::InvalidPrice {
                price: self.price.cents(),
            });
        }
        Ok(())
    }

    /// Materializes the input into an active product with a fresh ID.
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId::new(),
            name: self.name,
            price: self.price,
            description: self.description,
            category: self.category,
            stock_quantity: self.stock_quantity,
            weight_or_size: self.weight_or_size,
            pack_type: self.pack_type,
            image_path: self.image_path,
            is_active: true,
            is_best_seller: self.is_best_seller,
        }
    }
}
