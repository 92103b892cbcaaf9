//! Storefront coordinator driving carts, checkout, and order lifecycle.

use common::{OrderId, ProductId};
use domain::{Cart, Identity, NewProduct, Order, OrderDraft, OrderStatus, Product};
use store::{OrderPage, ProductPage, ReportFilter, ReportScope, StorefrontStore};

use crate::error::CheckoutError;
use crate::services::address_book::AddressBook;
use crate::services::cart_store::CartStore;
use crate::services::notifier::Notifier;

/// Coordinates the storefront flows over a store and the injected
/// collaborator capabilities.
///
/// Role gating happens here: admin-only commands check the acting identity
/// before touching the store, and report queries are scoped to the caller.
/// Everything that must be atomic is delegated to the store.
pub struct Storefront<S, A, C, N>
where
    S: StorefrontStore,
    A: AddressBook,
    C: CartStore,
    N: Notifier,
{
    store: S,
    addresses: A,
    carts: C,
    notifier: N,
}

impl<S, A, C, N> Storefront<S, A, C, N>
where
    S: StorefrontStore,
    A: AddressBook,
    C: CartStore,
    N: Notifier + Clone + Send + Sync + 'static,
{
    /// Creates a new storefront coordinator.
    pub fn new(store: S, addresses: A, carts: C, notifier: N) -> Self {
        Self {
            store,
            addresses,
            carts,
            notifier,
        }
    }

    // --- Cart ---

    /// Adds a product to the session cart.
    ///
    /// The stock check here is advisory (it runs against the live counter
    /// without a lock); checkout re-validates under lock.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        session: &str,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CheckoutError> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        let mut cart = self.carts.load(session).await?;
        cart.add(&product, quantity)?;
        self.carts.save(session, &cart).await?;

        tracing::info!(%product_id, quantity, "added to cart");
        Ok(cart)
    }

    /// Returns the session's current cart.
    pub async fn view_cart(&self, session: &str) -> Result<Cart, CheckoutError> {
        self.carts.load(session).await
    }

    /// Removes a product line from the session cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        session: &str,
        product_id: ProductId,
    ) -> Result<Cart, CheckoutError> {
        let mut cart = self.carts.load(session).await?;
        cart.remove(product_id);
        self.carts.save(session, &cart).await?;
        Ok(cart)
    }

    /// Empties the session cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, session: &str) -> Result<(), CheckoutError> {
        self.carts.clear(session).await
    }

    // --- Checkout ---

    /// Converts the session cart into a persisted order.
    ///
    /// Validates the cart is non-empty and the address is one of the
    /// customer's registered slots, then runs the atomic checkout in the
    /// store. The cart snapshot is only cleared after the store commits;
    /// the confirmation notification is spawned and never awaited.
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn place_order(
        &self,
        identity: &Identity,
        session: &str,
        selected_address: &str,
    ) -> Result<Order, CheckoutError> {
        metrics::counter!("checkout_total").increment(1);
        let started = std::time::Instant::now();

        let cart = self.carts.load(session).await?;
        if cart.is_empty() {
            metrics::counter!("checkout_failed").increment(1);
            return Err(CheckoutError::EmptyCart);
        }

        let known = self.addresses.addresses(&identity.username).await?;
        if selected_address.trim().is_empty() || !known.iter().any(|a| a == selected_address) {
            metrics::counter!("checkout_failed").increment(1);
            return Err(CheckoutError::InvalidAddress);
        }

        let draft = OrderDraft::from_cart(identity.clone(), selected_address, cart.lines());
        let order = match self.store.place_order(draft).await {
            Ok(order) => order,
            Err(e) => {
                metrics::counter!("checkout_failed").increment(1);
                return Err(e.into());
            }
        };

        // Cart clearing is a side effect outside the store transaction and
        // must only happen after the commit.
        self.carts.clear(session).await?;

        let notifier = self.notifier.clone();
        let email = order.email.clone();
        let order_id = order.id;
        tokio::spawn(async move {
            if let Err(e) = notifier.order_placed(&email, order_id).await {
                tracing::warn!(%order_id, error = %e, "order notification failed");
            }
        });

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, "order placed");
        Ok(order)
    }

    // --- Orders ---

    /// Runs the role-scoped order report.
    ///
    /// Page and page size are clamped to at least 1. The customer-name
    /// filter only applies for admins; the store drops it otherwise.
    #[tracing::instrument(skip(self, identity, filter), fields(username = %identity.username))]
    pub async fn order_reports(
        &self,
        identity: &Identity,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage, CheckoutError> {
        let scope = ReportScope::for_identity(identity);
        let page = page.max(1);
        let page_size = page_size.max(1);
        Ok(self
            .store
            .order_reports(&scope, filter, page, page_size)
            .await?)
    }

    /// Fetches one order, including soft-deleted ones for audit.
    ///
    /// Customers can only fetch their own orders.
    pub async fn get_order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::Store(store::StoreError::OrderNotFound(
                order_id,
            )))?;

        if !identity.is_admin() && !order.is_owned_by(&identity.username) {
            return Err(CheckoutError::Unauthorized);
        }
        Ok(order)
    }

    /// Cancels a pending order. Ownership rules live in the domain: a
    /// customer must own the order, an admin may cancel any pending one.
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn cancel_order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let order = self.store.cancel_order(order_id, identity).await?;
        metrics::counter!("orders_cancelled").increment(1);
        Ok(order)
    }

    /// Approves a pending order (admin only). Status change only; stock was
    /// already debited at checkout.
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn approve_order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        self.require_admin(identity)?;
        let order = self.store.approve_order(order_id).await?;
        metrics::counter!("orders_approved").increment(1);
        Ok(order)
    }

    /// Admin override: sets any recognized status and records a comment.
    #[tracing::instrument(skip(self, identity, comment), fields(username = %identity.username))]
    pub async fn update_order_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: OrderStatus,
        comment: Option<String>,
    ) -> Result<Order, CheckoutError> {
        self.require_admin(identity)?;
        Ok(self
            .store
            .set_order_status(order_id, status, comment)
            .await?)
    }

    /// Soft-deletes a rejected or completed order (admin only).
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn delete_order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        self.require_admin(identity)?;
        Ok(self.store.delete_order(order_id).await?)
    }

    // --- Catalog ---

    /// Lists active products for the storefront.
    pub async fn list_products(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ProductPage, CheckoutError> {
        Ok(self
            .store
            .list_active_products(page.max(1), page_size.max(1))
            .await?)
    }

    /// Fetches one product, active or not.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, CheckoutError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))
    }

    /// Creates a catalog product (admin only).
    #[tracing::instrument(skip(self, identity, input), fields(username = %identity.username))]
    pub async fn add_product(
        &self,
        identity: &Identity,
        input: NewProduct,
    ) -> Result<Product, CheckoutError> {
        self.require_admin(identity)?;
        input.validate()?;
        let product = input.into_product();
        self.store.insert_product(product.clone()).await?;
        Ok(product)
    }

    /// Updates a catalog product's fields (admin only). The active flag is
    /// left as stored; deactivation has its own command.
    #[tracing::instrument(skip(self, identity, input), fields(username = %identity.username))]
    pub async fn update_product(
        &self,
        identity: &Identity,
        product_id: ProductId,
        input: NewProduct,
    ) -> Result<Product, CheckoutError> {
        self.require_admin(identity)?;
        input.validate()?;

        let existing = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        let product = Product {
            id: existing.id,
            name: input.name,
            price: input.price,
            description: input.description,
            category: input.category,
            stock_quantity: input.stock_quantity,
            weight_or_size: input.weight_or_size,
            pack_type: input.pack_type,
            image_path: input.image_path.or(existing.image_path),
            is_active: existing.is_active,
            is_best_seller: input.is_best_seller,
        };
        self.store.update_product(product.clone()).await?;
        Ok(product)
    }

    /// Restocks a product (admin only).
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn restock_product(
        &self,
        identity: &Identity,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CheckoutError> {
        self.require_admin(identity)?;
        Ok(self.store.credit_stock(product_id, quantity).await?)
    }

    /// Soft-deletes a product (admin only). Returns false if it did not
    /// exist.
    #[tracing::instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn deactivate_product(
        &self,
        identity: &Identity,
        product_id: ProductId,
    ) -> Result<bool, CheckoutError> {
        self.require_admin(identity)?;
        Ok(self.store.deactivate_product(product_id).await?)
    }

    fn require_admin(&self, identity: &Identity) -> Result<(), CheckoutError> {
        if identity.is_admin() {
            Ok(())
        } else {
            Err(CheckoutError::Unauthorized)
        }
    }
}
