use common::{OrderId, ProductId};
use domain::OrderError;
use thiserror::Error;

/// Errors that can occur when interacting with the storefront store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist (or no longer exists).
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A checkout line asked for more units than the live stock holds.
    /// The whole transaction was rolled back; nothing was debited.
    #[error("Not enough stock for {product_name}: {available} available")]
    InsufficientStock {
        product_name: String,
        available: u32,
    },

    /// A status transition was rejected by the order's lifecycle rules.
    #[error(transparent)]
    Transition(#[from] OrderError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
