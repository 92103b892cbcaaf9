//! Catalog endpoints: storefront listing plus admin management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::ProductId;
use domain::{Money, NewProduct, Product};
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::session::resolve_identity;

// -- Request types --

#[derive(Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub weight_or_size: String,
    #[serde(default)]
    pub pack_type: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub is_best_seller: bool,
}

impl From<ProductInput> for NewProduct {
    fn from(input: ProductInput) -> Self {
        NewProduct {
            name: input.name,
            price: Money::from_cents(input.price_cents),
            description: input.description,
            category: input.category,
            stock_quantity: input.stock_quantity,
            weight_or_size: input.weight_or_size,
            pack_type: input.pack_type,
            image_path: input.image_path,
            is_best_seller: input.is_best_seller,
        }
    }
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    5
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub description: String,
    pub category: String,
    pub stock_quantity: u32,
    pub weight_or_size: String,
    pub pack_type: String,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub is_best_seller: bool,
}

#[derive(Serialize)]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    pub page: u32,
    pub total_pages: u32,
}

fn product_to_response(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id.to_string(),
        name: product.name.clone(),
        price_cents: product.price.cents(),
        description: product.description.clone(),
        category: product.category.clone(),
        stock_quantity: product.stock_quantity,
        weight_or_size: product.weight_or_size.clone(),
        pack_type: product.pack_type.clone(),
        image_path: product.image_path.clone(),
        is_active: product.is_active,
        is_best_seller: product.is_best_seller,
    }
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(ProductId::from_uuid(uuid))
}

// -- Handlers --

/// GET /products — paginated active-product listing.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductPageResponse>, ApiError> {
    let page = state
        .storefront
        .list_products(query.page, query.page_size)
        .await?;

    Ok(Json(ProductPageResponse {
        products: page.products.iter().map(product_to_response).collect(),
        page: page.page,
        total_pages: page.total_pages,
    }))
}

/// GET /products/{id} — product details, active or not.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let product = state.storefront.get_product(product_id).await?;
    Ok(Json(product_to_response(&product)))
}

/// POST /products — create a catalog product (admin).
#[tracing::instrument(skip(state, headers, input))]
pub async fn create<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;

    let product = state.storefront.add_product(&identity, input.into()).await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(product_to_response(&product)),
    ))
}

/// PUT /products/{id} — update a catalog product (admin).
#[tracing::instrument(skip(state, headers, input))]
pub async fn update<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let product_id = parse_product_id(&id)?;

    let product = state
        .storefront
        .update_product(&identity, product_id, input.into())
        .await?;
    Ok(Json(product_to_response(&product)))
}

/// POST /products/{id}/deactivate — soft-delete a product (admin).
#[tracing::instrument(skip(state, headers))]
pub async fn deactivate<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let product_id = parse_product_id(&id)?;

    let removed = state
        .storefront
        .deactivate_product(&identity, product_id)
        .await?;
    let message = if removed {
        "Product deleted successfully."
    } else {
        "Product not found or already deleted."
    };
    Ok(Json(serde_json::json!({ "message": message })))
}

/// POST /products/{id}/restock — credit stock back (admin).
#[tracing::instrument(skip(state, headers, req))]
pub async fn restock<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let product_id = parse_product_id(&id)?;

    state
        .storefront
        .restock_product(&identity, product_id, req.quantity)
        .await?;
    let product = state.storefront.get_product(product_id).await?;
    Ok(Json(product_to_response(&product)))
}
