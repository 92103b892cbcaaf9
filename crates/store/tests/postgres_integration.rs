//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use domain::{Cart, CartLine, Identity, Money, NewProduct, OrderDraft, OrderStatus, Product};
use sqlx::PgPool;
use store::{
    InMemoryStore, PostgresStore, ReportFilter, ReportScope, StoreError, StorefrontStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/0001_create_storefront_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE order_items, orders, products")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn seed_product(name: &str, price_cents: i64, stock: u32) -> Product {
    NewProduct {
        name: name.to_string(),
        price: Money::from_cents(price_cents),
        description: "Integration snack".to_string(),
        category: "Chips".to_string(),
        stock_quantity: stock,
        weight_or_size: "100g".to_string(),
        pack_type: "Pouch".to_string(),
        image_path: None,
        is_best_seller: false,
    }
    .into_product()
}

fn alice() -> Identity {
    Identity::customer("alice", "Alice A.", "alice@example.com")
}

fn draft_for(product: &Product, quantity: u32) -> OrderDraft {
    let mut cart = Cart::new();
    cart.add(product, quantity).unwrap();
    OrderDraft::from_cart(alice(), "12 Hill Road", cart.lines())
}

#[tokio::test]
async fn product_roundtrip() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 5);

    store.insert_product(product.clone()).await.unwrap();
    let fetched = store.get_product(product.id).await.unwrap().unwrap();

    assert_eq!(fetched, product);
}

#[tokio::test]
async fn update_product_replaces_fields() {
    let store = get_test_store().await;
    let mut product = seed_product("Salted Peanuts", 500, 5);
    store.insert_product(product.clone()).await.unwrap();

    product.name = "Roasted Peanuts".to_string();
    product.price = Money::from_cents(650);
    store.update_product(product.clone()).await.unwrap();

    let fetched = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Roasted Peanuts");
    assert_eq!(fetched.price.cents(), 650);
}

#[tokio::test]
async fn update_missing_product_fails() {
    let store = get_test_store().await;
    let product = seed_product("Ghost Snack", 500, 5);

    let result = store.update_product(product).await;
    assert!(matches!(result, Err(StoreError::ProductNotFound(_))));
}

#[tokio::test]
async fn list_active_products_paginates() {
    let store = get_test_store().await;
    for i in 0..7 {
        store
            .insert_product(seed_product(&format!("Snack {i}"), 100, 5))
            .await
            .unwrap();
    }
    let mut inactive = seed_product("Hidden Snack", 100, 5);
    inactive.is_active = false;
    store.insert_product(inactive).await.unwrap();

    let page = store.list_active_products(1, 5).await.unwrap();
    assert_eq!(page.products.len(), 5);
    assert_eq!(page.total_pages, 2);

    let page2 = store.list_active_products(2, 5).await.unwrap();
    assert_eq!(page2.products.len(), 2);
    assert!(page2.products.iter().all(|p| p.is_active));
}

#[tokio::test]
async fn checkout_creates_order_and_debits_stock() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 5);
    store.insert_product(product.clone()).await.unwrap();

    let order = store.place_order(draft_for(&product, 3)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.items[0].unit_price.cents(), 500);

    let stored = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock_quantity, 2);

    let fetched = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.items, order.items);
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn checkout_insufficient_stock_rolls_back_everything() {
    let store = get_test_store().await;
    let in_stock = seed_product("Salted Peanuts", 500, 5);
    let scarce = seed_product("Rare Truffle Chips", 900, 1);
    store.insert_product(in_stock.clone()).await.unwrap();
    store.insert_product(scarce.clone()).await.unwrap();

    // Two lines; the second one over-asks. Built by hand to bypass the
    // cart's advisory check.
    let draft = OrderDraft {
        customer: alice(),
        delivery_address: "12 Hill Road".to_string(),
        lines: vec![
            CartLine {
                product_id: in_stock.id,
                product_name: in_stock.name.clone(),
                unit_price: in_stock.price,
                quantity: 2,
            },
            CartLine {
                product_id: scarce.id,
                product_name: scarce.name.clone(),
                unit_price: scarce.price,
                quantity: 3,
            },
        ],
    };

    let result = store.place_order(draft).await;
    match result {
        Err(StoreError::InsufficientStock {
            product_name,
            available,
        }) => {
            assert_eq!(product_name, "Rare Truffle Chips");
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // No debit happened for either line, and no order row exists.
    let a = store.get_product(in_stock.id).await.unwrap().unwrap();
    let b = store.get_product(scarce.id).await.unwrap().unwrap();
    assert_eq!(a.stock_quantity, 5);
    assert_eq!(b.stock_quantity, 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn checkout_of_vanished_product_reports_insufficient_stock() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 5);
    // Never inserted: the product id resolves nowhere.

    let draft = OrderDraft {
        customer: alice(),
        delivery_address: "12 Hill Road".to_string(),
        lines: vec![CartLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
        }],
    };

    let result = store.place_order(draft).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock { available: 0, .. })
    ));
}

#[tokio::test]
async fn checkout_deactivates_product_at_zero_stock() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 3);
    store.insert_product(product.clone()).await.unwrap();

    store.place_order(draft_for(&product, 3)).await.unwrap();

    let stored = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock_quantity, 0);
    assert!(!stored.is_active);
}

#[tokio::test]
async fn concurrent_checkouts_of_same_product_serialize() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 5);
    store.insert_product(product.clone()).await.unwrap();

    // Both drafts validate against stock 5 before either commits.
    let draft_a = draft_for(&product, 3);
    let draft_b = draft_for(&product, 3);

    let store_a = store.clone();
    let store_b = store.clone();
    let (res_a, res_b) = tokio::join!(
        tokio::spawn(async move { store_a.place_order(draft_a).await }),
        tokio::spawn(async move { store_b.place_order(draft_b).await }),
    );
    let res_a = res_a.unwrap();
    let res_b = res_b.unwrap();

    // Exactly one side wins; the loser sees insufficient stock.
    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one checkout must succeed");
    let failure = if res_a.is_err() { res_a } else { res_b };
    assert!(matches!(
        failure,
        Err(StoreError::InsufficientStock { available: 2, .. })
    ));

    let stored = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock_quantity, 2);
}

#[tokio::test]
async fn cancel_requires_ownership_and_pending_status() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    // Scenario C: bob cannot cancel alice's order.
    let bob = Identity::customer("bob", "Bob B.", "bob@example.com");
    let result = store.cancel_order(order.id, &bob).await;
    assert!(matches!(
        result,
        Err(StoreError::Transition(domain::OrderError::NotOwner))
    ));

    let untouched = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::Pending);

    // The owner can; a second cancel is rejected.
    let cancelled = store.cancel_order(order.id, &alice()).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_by_customer);

    let again = store.cancel_order(order.id, &alice()).await;
    assert!(matches!(again, Err(StoreError::Transition(_))));
}

#[tokio::test]
async fn admin_cancel_sets_admin_flag() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    let admin = Identity::admin("root", "Root", "root@example.com");
    let cancelled = store.cancel_order(order.id, &admin).await.unwrap();

    assert!(cancelled.cancelled_by_admin);
    assert!(!cancelled.cancelled_by_customer);
}

#[tokio::test]
async fn approve_does_not_touch_stock() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 5);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 3)).await.unwrap();

    let approved = store.approve_order(order.id).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Approved);

    // Checkout already debited 3; approval must not debit again.
    let stored = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock_quantity, 2);
}

#[tokio::test]
async fn soft_delete_hides_from_reports_keeps_audit_row() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    store
        .set_order_status(order.id, OrderStatus::Rejected, Some("damaged".to_string()))
        .await
        .unwrap();
    let deleted = store.delete_order(order.id).await.unwrap();
    assert!(deleted.deleted);

    let page = store
        .order_reports(&ReportScope::Admin, &ReportFilter::new(), 1, 10)
        .await
        .unwrap();
    assert!(page.orders.is_empty());

    let audit = store.get_order(order.id).await.unwrap().unwrap();
    assert!(audit.deleted);
    assert_eq!(audit.admin_comment.as_deref(), Some("damaged"));
}

#[tokio::test]
async fn delete_pending_order_is_rejected() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    let result = store.delete_order(order.id).await;
    assert!(matches!(result, Err(StoreError::Transition(_))));
}

#[tokio::test]
async fn reports_scope_and_date_filters() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 50);
    store.insert_product(product.clone()).await.unwrap();

    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    let live = store.get_product(product.id).await.unwrap().unwrap();
    let mut cart = Cart::new();
    cart.add(&live, 1).unwrap();
    store
        .place_order(OrderDraft::from_cart(
            Identity::customer("bob", "Bob B.", "bob@example.com"),
            "9 Lake View",
            cart.lines(),
        ))
        .await
        .unwrap();

    // Customer scope only sees their own orders.
    let alice_page = store
        .order_reports(
            &ReportScope::Customer("alice".to_string()),
            &ReportFilter::new(),
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(alice_page.orders.len(), 1);
    assert_eq!(alice_page.orders[0].id, order.id);

    // Today's date range includes both orders (inclusive end-of-day).
    let today = order.placed_at.date_naive();
    let dated = store
        .order_reports(
            &ReportScope::Admin,
            &ReportFilter::new().from_date(today).to_date(today),
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(dated.orders.len(), 2);

    // A range ending yesterday excludes everything.
    let yesterday = today.pred_opt().unwrap();
    let stale = store
        .order_reports(
            &ReportScope::Admin,
            &ReportFilter::new().to_date(yesterday),
            1,
            10,
        )
        .await
        .unwrap();
    assert!(stale.orders.is_empty());
}

#[tokio::test]
async fn report_total_pages_use_role_scoped_total() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 100);
    store.insert_product(product.clone()).await.unwrap();

    for _ in 0..6 {
        let live = store.get_product(product.id).await.unwrap().unwrap();
        let mut cart = Cart::new();
        cart.add(&live, 1).unwrap();
        store
            .place_order(OrderDraft::from_cart(alice(), "12 Hill Road", cart.lines()))
            .await
            .unwrap();
    }

    // A status filter narrows the page but not the page count.
    let page = store
        .order_reports(
            &ReportScope::Admin,
            &ReportFilter::new().status(OrderStatus::Cancelled),
            1,
            5,
        )
        .await
        .unwrap();
    assert!(page.orders.is_empty());
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn unknown_stored_status_rejects_transitions() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    // Simulate a row written by a newer (or broken) version.
    sqlx::query("UPDATE orders SET order_status = 'Shipped' WHERE id = $1")
        .bind(order.id.as_uuid())
        .execute(store.pool())
        .await
        .unwrap();

    let result = store.approve_order(order.id).await;
    assert!(matches!(result, Err(StoreError::Transition(_))));

    let fetched = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, OrderStatus::Unknown);
}

#[tokio::test]
async fn memory_store_matches_postgres_checkout_contract() {
    // Smoke test that the two backends agree on the atomicity outcome.
    let memory = InMemoryStore::new();
    let product = seed_product("Salted Peanuts", 500, 5);
    memory.insert_product(product.clone()).await.unwrap();

    let ok = memory.place_order(draft_for(&product, 3)).await;
    assert!(ok.is_ok());

    let mut over = draft_for(&product, 1);
    over.lines[0].quantity = 3;
    let result = memory.place_order(over).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock { available: 2, .. })
    ));
}

#[tokio::test]
async fn date_filter_boundaries_are_utc_days() {
    let store = get_test_store().await;
    let product = seed_product("Salted Peanuts", 500, 10);
    store.insert_product(product.clone()).await.unwrap();
    let order = store.place_order(draft_for(&product, 1)).await.unwrap();

    // Pin the order to a known timestamp near end-of-day.
    sqlx::query("UPDATE orders SET placed_at = '2025-03-10T23:59:58Z' WHERE id = $1")
        .bind(order.id.as_uuid())
        .execute(store.pool())
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let hit = store
        .order_reports(
            &ReportScope::Admin,
            &ReportFilter::new().from_date(day).to_date(day),
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(hit.orders.len(), 1);

    let next_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let miss = store
        .order_reports(
            &ReportScope::Admin,
            &ReportFilter::new().from_date(next_day),
            1,
            10,
        )
        .await
        .unwrap();
    assert!(miss.orders.is_empty());
}
