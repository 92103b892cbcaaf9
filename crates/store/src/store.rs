use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{Identity, Order, OrderDraft, OrderStatus, Product};

use crate::Result;
use crate::query::{OrderPage, ProductPage, ReportFilter, ReportScope};

/// Core trait for storefront storage implementations.
///
/// Implementations must be thread-safe (Send + Sync) and must honor the
/// atomicity contract on every method that mutates stock or order status:
/// the whole operation commits or none of it does, and stock validation
/// happens against the same snapshot that gets debited.
#[async_trait]
pub trait StorefrontStore: Send + Sync {
    // --- Catalog ---

    /// Inserts a new catalog product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Replaces an existing product's fields.
    ///
    /// Fails with `ProductNotFound` if the id does not resolve.
    async fn update_product(&self, product: Product) -> Result<()>;

    /// Fetches a product by id, active or not.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists active products in stable name order with 1-based pagination.
    async fn list_active_products(&self, page: u32, page_size: u32) -> Result<ProductPage>;

    /// Soft-deletes a product by clearing its active flag.
    ///
    /// Returns false if the product did not exist.
    async fn deactivate_product(&self, id: ProductId) -> Result<bool>;

    /// Restocks a product by `quantity` units.
    ///
    /// Fails with `ProductNotFound` if the id does not resolve.
    async fn credit_stock(&self, id: ProductId, quantity: u32) -> Result<()>;

    // --- Checkout ---

    /// Executes the checkout transaction for a draft.
    ///
    /// Atomically: re-validates every line against current stock under a
    /// per-product lock, snapshots name/price from the live rows, persists
    /// the order as `Pending` with a server-assigned UTC timestamp, and
    /// debits stock (deactivating any product that reaches zero). If any
    /// line fails validation the whole transaction rolls back: no order row
    /// and no debit for any line.
    async fn place_order(&self, draft: OrderDraft) -> Result<Order>;

    // --- Orders ---

    /// Fetches an order by id, including items.
    ///
    /// Soft-deleted orders are returned too; this is the audit path.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Cancels an order on behalf of `actor`.
    ///
    /// Re-reads the current status under lock before checking legality.
    /// Customers must own the order; admins may cancel any pending order.
    async fn cancel_order(&self, id: OrderId, actor: &Identity) -> Result<Order>;

    /// Approves a pending order. Status change only; stock was debited at
    /// checkout.
    async fn approve_order(&self, id: OrderId) -> Result<Order>;

    /// Admin override: sets any recognized status and records the comment.
    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        comment: Option<String>,
    ) -> Result<Order>;

    /// Soft-deletes a rejected or completed order.
    async fn delete_order(&self, id: OrderId) -> Result<Order>;

    /// Runs the role-scoped order report.
    ///
    /// Excludes soft-deleted orders, applies the filter criteria, orders
    /// newest first (placed_at, then id, both descending), and serves the
    /// requested 1-based page. The total-page count is computed from the
    /// role-scoped total, not the filtered one.
    async fn order_reports(
        &self,
        scope: &ReportScope,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage>;
}
