use common::ProductId;
use domain::{CartError, ProductError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the storefront coordinator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was attempted with no cart lines.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The selected delivery address is not one of the customer's slots.
    #[error("Please select a valid delivery address")]
    InvalidAddress,

    /// The acting identity lacks the required role or ownership.
    #[error("You are not allowed to perform this action")]
    Unauthorized,

    /// The product id did not resolve to an active product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A cart mutation was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Product input failed validation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// The store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session cart snapshot could not be read or written.
    #[error("Session storage error: {0}")]
    Session(String),
}
