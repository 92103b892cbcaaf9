//! Domain model for the snackshop storefront.
//!
//! This crate provides the pure, storage-agnostic core:
//! - Product catalog entries with stock counters
//! - The session-owned Cart and its merge/validation rules
//! - The Order aggregate with its status state machine
//! - Money, identity, and role value objects
//!
//! No I/O happens here; the store and checkout crates drive these types.

pub mod cart;
pub mod identity;
pub mod money;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use identity::{Identity, Role};
pub use money::Money;
pub use order::{Order, OrderDraft, OrderError, OrderItem, OrderStatus};
pub use product::{NewProduct, Product, ProductError};
