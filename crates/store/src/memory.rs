use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveTime};
use common::{OrderId, ProductId};
use domain::{Identity, Order, OrderDraft, OrderItem, OrderStatus, Product};
use tokio::sync::RwLock;

use crate::query::{OrderPage, ProductPage, ReportFilter, ReportScope, page_count};
use crate::store::StorefrontStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory storefront store for tests and standalone runs.
///
/// A single writer lock over the whole state is the critical section: every
/// mutating operation holds it from validation through write, which gives
/// the same atomicity contract the PostgreSQL implementation gets from
/// transactions and row locks.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Returns the number of stored orders, soft-deleted included.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all products and orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.products.clear();
        state.orders.clear();
    }

    fn transition<F>(state: &mut State, id: OrderId, apply: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), domain::OrderError>,
    {
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        apply(order)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl StorefrontStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product;
                Ok(())
            }
            None => Err(StoreError::ProductNotFound(product.id)),
        }
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_active_products(&self, page: u32, page_size: u32) -> Result<ProductPage> {
        let state = self.state.read().await;
        let mut active: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let total = active.len() as u64;
        let offset = page.saturating_sub(1) as usize * page_size as usize;
        let products = active
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(ProductPage {
            products,
            page,
            total_pages: page_count(total, page_size),
        })
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&id) {
            Some(product) => {
                product.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn credit_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.stock_quantity += quantity;
        Ok(())
    }

    async fn place_order(&self, draft: OrderDraft) -> Result<Order> {
        let mut state = self.state.write().await;

        // Validate every line against current stock before touching anything,
        // freezing name/price snapshots from the live products as we go.
        let mut items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let Some(product) = state.products.get(&line.product_id) else {
                return Err(StoreError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    available: 0,
                });
            };
            if line.quantity > product.stock_quantity {
                return Err(StoreError::InsufficientStock {
                    product_name: product.name.clone(),
                    available: product.stock_quantity,
                });
            }
            items.push(OrderItem::new(
                line.product_id,
                product.name.clone(),
                product.price,
                line.quantity,
            ));
        }

        let order = Order {
            id: OrderId::new(),
            customer_name: draft.customer.name.clone(),
            username: draft.customer.username.clone(),
            email: draft.customer.email.clone(),
            delivery_address: draft.delivery_address.clone(),
            placed_at: chrono::Utc::now(),
            items,
            status: OrderStatus::Pending,
            admin_comment: None,
            cancelled_by_admin: false,
            cancelled_by_customer: false,
            deleted: false,
        };

        // Debit stock; products that reach zero leave the storefront.
        for line in &draft.lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock_quantity -= line.quantity;
                if product.stock_quantity == 0 {
                    product.is_active = false;
                }
            }
        }

        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn cancel_order(&self, id: OrderId, actor: &Identity) -> Result<Order> {
        let mut state = self.state.write().await;
        Self::transition(&mut state, id, |order| order.cancel(actor))
    }

    async fn approve_order(&self, id: OrderId) -> Result<Order> {
        let mut state = self.state.write().await;
        Self::transition(&mut state, id, |order| order.approve())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        comment: Option<String>,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        Self::transition(&mut state, id, |order| order.set_status(status, comment))
    }

    async fn delete_order(&self, id: OrderId) -> Result<Order> {
        let mut state = self.state.write().await;
        Self::transition(&mut state, id, |order| order.soft_delete())
    }

    async fn order_reports(
        &self,
        scope: &ReportScope,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage> {
        let state = self.state.read().await;

        let in_scope = |order: &Order| match scope {
            ReportScope::Admin => true,
            ReportScope::Customer(username) => order.username == *username,
        };

        // Total pages come from the role-scoped, unfiltered count.
        let total = state
            .orders
            .values()
            .filter(|o| !o.deleted && in_scope(o))
            .count() as u64;

        let name_filter = match scope {
            ReportScope::Admin => filter.customer_name.as_deref(),
            ReportScope::Customer(_) => None,
        };

        let mut matching: Vec<Order> = state
            .orders
            .values()
            .filter(|o| !o.deleted && in_scope(o))
            .filter(|o| match filter.status {
                Some(status) => o.status == status,
                None => true,
            })
            .filter(|o| match name_filter {
                Some(name) => o
                    .customer_name
                    .to_lowercase()
                    .contains(&name.to_lowercase()),
                None => true,
            })
            .filter(|o| match filter.from_date {
                Some(from) => o.placed_at >= from.and_time(NaiveTime::MIN).and_utc(),
                None => true,
            })
            .filter(|o| match filter.to_date {
                Some(to) => o.placed_at < (to + Days::new(1)).and_time(NaiveTime::MIN).and_utc(),
                None => true,
            })
            .cloned()
            .collect();

        // Newest first, with id as the stable tiebreaker.
        matching.sort_by(|a, b| {
            b.placed_at
                .cmp(&a.placed_at)
                .then_with(|| b.id.as_uuid().cmp(&a.id.as_uuid()))
        });

        let offset = page.saturating_sub(1) as usize * page_size as usize;
        let orders = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Ok(OrderPage {
            orders,
            page,
            total_pages: page_count(total, page_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, NewProduct, OrderDraft};

    fn seed_product(name: &str, price_cents: i64, stock: u32) -> Product {
        NewProduct {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            description: String::new(),
            category: "Chips".to_string(),
            stock_quantity: stock,
            weight_or_size: "100g".to_string(),
            pack_type: "Pouch".to_string(),
            image_path: None,
            is_best_seller: false,
        }
        .into_product()
    }

    fn draft_for(product: &Product, quantity: u32) -> OrderDraft {
        let mut cart = domain::Cart::new();
        cart.add(product, quantity).unwrap();
        OrderDraft::from_cart(
            Identity::customer("alice", "Alice A.", "alice@example.com"),
            "12 Hill Road",
            cart.lines(),
        )
    }

    #[tokio::test]
    async fn place_order_debits_stock() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 5);
        store.insert_product(product.clone()).await.unwrap();

        let order = store.place_order(draft_for(&product, 3)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);

        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 2);
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn place_order_insufficient_stock_rolls_back() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 5);
        store.insert_product(product.clone()).await.unwrap();

        // Bypass the cart's advisory check to hit the store validation.
        let mut draft = draft_for(&product, 5);
        draft.lines[0].quantity = 6;

        let result = store.place_order(draft).await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { available: 5, .. })
        ));
        assert_eq!(store.order_count().await, 0);
        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 5);
    }

    #[tokio::test]
    async fn place_order_deactivates_at_zero() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 3);
        store.insert_product(product.clone()).await.unwrap();

        store.place_order(draft_for(&product, 3)).await.unwrap();

        let stored = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 0);
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn snapshots_survive_product_edits() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 10);
        store.insert_product(product.clone()).await.unwrap();

        let order = store.place_order(draft_for(&product, 1)).await.unwrap();

        let mut edited = product.clone();
        edited.name = "Roasted Peanuts".to_string();
        edited.price = Money::from_cents(999);
        store.update_product(edited).await.unwrap();

        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].product_name, "Salted Peanuts");
        assert_eq!(stored.items[0].unit_price.cents(), 500);
    }

    #[tokio::test]
    async fn cancel_transition_and_idempotence() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 5);
        store.insert_product(product.clone()).await.unwrap();
        let order = store.place_order(draft_for(&product, 1)).await.unwrap();

        let alice = Identity::customer("alice", "Alice A.", "alice@example.com");
        let cancelled = store.cancel_order(order.id, &alice).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_by_customer);

        let again = store.cancel_order(order.id, &alice).await;
        assert!(matches!(again, Err(StoreError::Transition(_))));
    }

    #[tokio::test]
    async fn deleted_orders_hidden_from_reports_but_fetchable() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 5);
        store.insert_product(product.clone()).await.unwrap();
        let order = store.place_order(draft_for(&product, 1)).await.unwrap();

        store
            .set_order_status(order.id, OrderStatus::Rejected, None)
            .await
            .unwrap();
        store.delete_order(order.id).await.unwrap();

        let page = store
            .order_reports(&ReportScope::Admin, &ReportFilter::new(), 1, 10)
            .await
            .unwrap();
        assert!(page.orders.is_empty());

        let audit = store.get_order(order.id).await.unwrap().unwrap();
        assert!(audit.deleted);
    }

    #[tokio::test]
    async fn reports_scope_to_owner() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 50);
        store.insert_product(product.clone()).await.unwrap();

        store.place_order(draft_for(&product, 1)).await.unwrap();

        let mut cart = domain::Cart::new();
        let live = store.get_product(product.id).await.unwrap().unwrap();
        cart.add(&live, 1).unwrap();
        let bob_draft = OrderDraft::from_cart(
            Identity::customer("bob", "Bob B.", "bob@example.com"),
            "9 Lake View",
            cart.lines(),
        );
        store.place_order(bob_draft).await.unwrap();

        let page = store
            .order_reports(
                &ReportScope::Customer("alice".to_string()),
                &ReportFilter::new(),
                1,
                10,
            )
            .await
            .unwrap();

        assert_eq!(page.orders.len(), 1);
        assert!(page.orders.iter().all(|o| o.username == "alice"));
    }

    #[tokio::test]
    async fn reports_filter_by_status_and_name() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 50);
        store.insert_product(product.clone()).await.unwrap();

        let order = store.place_order(draft_for(&product, 1)).await.unwrap();
        store.approve_order(order.id).await.unwrap();

        let live = store.get_product(product.id).await.unwrap().unwrap();
        let mut cart = domain::Cart::new();
        cart.add(&live, 1).unwrap();
        store
            .place_order(OrderDraft::from_cart(
                Identity::customer("bob", "Bob B.", "bob@example.com"),
                "9 Lake View",
                cart.lines(),
            ))
            .await
            .unwrap();

        let approved = store
            .order_reports(
                &ReportScope::Admin,
                &ReportFilter::new().status(OrderStatus::Approved),
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(approved.orders.len(), 1);
        assert_eq!(approved.orders[0].id, order.id);

        let by_name = store
            .order_reports(
                &ReportScope::Admin,
                &ReportFilter::new().customer_name("bob"),
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(by_name.orders.len(), 1);
        assert_eq!(by_name.orders[0].username, "bob");
    }

    #[tokio::test]
    async fn customer_scope_ignores_name_filter() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 50);
        store.insert_product(product.clone()).await.unwrap();
        store.place_order(draft_for(&product, 1)).await.unwrap();

        // A customer passing someone else's name must still see only their
        // own orders, unfiltered by the name.
        let page = store
            .order_reports(
                &ReportScope::Customer("alice".to_string()),
                &ReportFilter::new().customer_name("zzz-nobody"),
                1,
                10,
            )
            .await
            .unwrap();

        assert_eq!(page.orders.len(), 1);
    }

    #[tokio::test]
    async fn report_pagination_is_newest_first() {
        let store = InMemoryStore::new();
        let product = seed_product("Salted Peanuts", 500, 100);
        store.insert_product(product.clone()).await.unwrap();

        let mut ids = Vec::new();
        for _ in 0..7 {
            let live = store.get_product(product.id).await.unwrap().unwrap();
            let mut cart = domain::Cart::new();
            cart.add(&live, 1).unwrap();
            let draft = OrderDraft::from_cart(
                Identity::customer("alice", "Alice A.", "alice@example.com"),
                "12 Hill Road",
                cart.lines(),
            );
            ids.push(store.place_order(draft).await.unwrap().id);
        }

        let first = store
            .order_reports(&ReportScope::Admin, &ReportFilter::new(), 1, 3)
            .await
            .unwrap();
        let second = store
            .order_reports(&ReportScope::Admin, &ReportFilter::new(), 2, 3)
            .await
            .unwrap();

        assert_eq!(first.orders.len(), 3);
        assert_eq!(second.orders.len(), 3);
        assert_eq!(first.total_pages, 3);
        // Newest first: pages never repeat an order.
        let seen: Vec<_> = first
            .orders
            .iter()
            .chain(second.orders.iter())
            .map(|o| o.id)
            .collect();
        let unique: std::collections::HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());
        assert!(first.orders[0].placed_at >= first.orders[2].placed_at);
    }
}
