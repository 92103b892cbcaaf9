//! Durable storage for the snackshop storefront.
//!
//! This crate owns everything that must be atomic against the durable
//! store:
//! - The checkout transaction: validate stock, snapshot line items, debit
//!   inventory, and persist the order, all or nothing
//! - Order status transitions, each re-reading the row under lock before
//!   checking legality
//! - The role-scoped report queries
//!
//! Two implementations of [`StorefrontStore`] are provided: [`PostgresStore`]
//! (sqlx/PostgreSQL with explicit transactions and row-level `FOR UPDATE`
//! locking) and [`InMemoryStore`] (a single-lock backend for tests and
//! standalone runs).

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderPage, ProductPage, ReportFilter, ReportScope};
pub use store::StorefrontStore;
