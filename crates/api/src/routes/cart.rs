//! Session cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::ProductId;
use domain::Cart;
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::session::{resolve_identity, session_token};

// -- Request types --

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub item_count: u32,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct AddToCartResponse {
    pub message: String,
    pub cart: CartResponse,
}

fn cart_to_response(cart: &Cart) -> CartResponse {
    CartResponse {
        lines: cart
            .lines()
            .iter()
            .map(|line| CartLineResponse {
                product_id: line.product_id.to_string(),
                product_name: line.product_name.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
            })
            .collect(),
        item_count: cart.item_count(),
        total_cents: cart.total().cents(),
    }
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(ProductId::from_uuid(uuid))
}

// -- Handlers --

/// POST /cart/items — add a product to the session cart.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<(axum::http::StatusCode, Json<AddToCartResponse>), ApiError> {
    resolve_identity(&state.sessions, &headers)?;
    let session = session_token(&headers)?;
    let product_id = parse_product_id(&req.product_id)?;

    let cart = state
        .storefront
        .add_to_cart(session, product_id, req.quantity)
        .await?;

    let name = cart
        .lines()
        .iter()
        .find(|l| l.product_id == product_id)
        .map(|l| l.product_name.clone())
        .unwrap_or_default();

    Ok((
        axum::http::StatusCode::CREATED,
        Json(AddToCartResponse {
            message: format!("{} (qty {}) added to cart.", name, req.quantity),
            cart: cart_to_response(&cart),
        }),
    ))
}

/// GET /cart — current cart lines and totals.
#[tracing::instrument(skip(state, headers))]
pub async fn view<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    resolve_identity(&state.sessions, &headers)?;
    let session = session_token(&headers)?;

    let cart = state.storefront.view_cart(session).await?;
    Ok(Json(cart_to_response(&cart)))
}

/// DELETE /cart/items/{product_id} — remove one line.
#[tracing::instrument(skip(state, headers))]
pub async fn remove<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    resolve_identity(&state.sessions, &headers)?;
    let session = session_token(&headers)?;
    let product_id = parse_product_id(&product_id)?;

    let cart = state
        .storefront
        .remove_from_cart(session, product_id)
        .await?;
    Ok(Json(cart_to_response(&cart)))
}

/// DELETE /cart — clear the whole cart.
#[tracing::instrument(skip(state, headers))]
pub async fn clear<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    resolve_identity(&state.sessions, &headers)?;
    let session = session_token(&headers)?;

    state.storefront.clear_cart(session).await?;
    Ok(Json(cart_to_response(&Cart::new())))
}
