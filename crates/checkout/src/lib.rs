//! Storefront coordination layer.
//!
//! Sits between the HTTP surface and the store: loads and saves session
//! cart snapshots, runs the place-order flow (address validation, the
//! atomic checkout, post-commit cart clearing and notification), and gates
//! the admin-only catalog and order lifecycle commands.

pub mod coordinator;
pub mod error;
pub mod services;

pub use coordinator::Storefront;
pub use error::CheckoutError;
pub use services::address_book::{AddressBook, InMemoryAddressBook};
pub use services::cart_store::{CartStore, InMemoryCartStore};
pub use services::notifier::{InMemoryNotifier, Notifier};
