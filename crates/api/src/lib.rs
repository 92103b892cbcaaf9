//! HTTP API server with observability for the snackshop storefront.
//!
//! Provides REST endpoints for the catalog, session carts, checkout, and
//! order lifecycle, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{InMemoryAddressBook, InMemoryCartStore, InMemoryNotifier, Storefront};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;
use session::SessionStore;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/sessions", post(routes::sessions::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route(
            "/products/{id}/deactivate",
            post(routes::products::deactivate::<S>),
        )
        .route("/products/{id}/restock", post(routes::products::restock::<S>))
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart", delete(routes::cart::clear::<S>))
        .route("/cart/items", post(routes::cart::add::<S>))
        .route("/cart/items/{product_id}", delete(routes::cart::remove::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders", get(routes::orders::reports::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/approve", post(routes::orders::approve::<S>))
        .route("/orders/{id}/status", post(routes::orders::update_status::<S>))
        .route("/orders/{id}/delete", post(routes::orders::delete::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with in-memory collaborator
/// services wired around the given store.
pub fn create_default_state<S: StorefrontStore + 'static>(store: S) -> Arc<AppState<S>> {
    let address_book = InMemoryAddressBook::new();
    let storefront = Storefront::new(
        store,
        address_book.clone(),
        InMemoryCartStore::new(),
        InMemoryNotifier::new(),
    );

    Arc::new(AppState {
        storefront,
        sessions: SessionStore::new(),
        address_book,
    })
}
