//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use checkout::{InMemoryAddressBook, InMemoryCartStore, InMemoryNotifier, Storefront};
use chrono::NaiveDate;
use common::OrderId;
use domain::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{ReportFilter, StorefrontStore};

use crate::error::ApiError;
use crate::session::{SessionStore, resolve_identity, session_token};

/// Shared application state accessible from all handlers.
pub struct AppState<S: StorefrontStore> {
    pub storefront: Storefront<S, InMemoryAddressBook, InMemoryCartStore, InMemoryNotifier>,
    pub sessions: SessionStore,
    pub address_book: InMemoryAddressBook,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub selected_address: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub status: Option<String>,
    pub customer_name: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
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
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_name: String,
    pub username: String,
    pub email: String,
    pub delivery_address: String,
    pub placed_at: String,
    pub status: String,
    pub admin_comment: Option<String>,
    pub cancelled_by_admin: bool,
    pub cancelled_by_customer: bool,
    pub deleted: bool,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct OrderActionResponse {
    pub order_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct OrderReportResponse {
    pub orders: Vec<OrderResponse>,
    pub page: u32,
    pub total_pages: u32,
}

fn order_to_response(order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        customer_name: order.customer_name.clone(),
        username: order.username.clone(),
        email: order.email.clone(),
        delivery_address: order.delivery_address.clone(),
        placed_at: order.placed_at.to_rfc3339(),
        status: order.status.to_string(),
        admin_comment: order.admin_comment.clone(),
        cancelled_by_admin: order.cancelled_by_admin,
        cancelled_by_customer: order.cancelled_by_customer,
        deleted: order.deleted,
        items: order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                unit_price_cents: item.unit_price.cents(),
                quantity: item.quantity,
            })
            .collect(),
        total_cents: order.total().cents(),
    }
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

// -- Handlers --

/// POST /orders — convert the session cart into a persisted order.
#[tracing::instrument(skip(state, headers, req))]
pub async fn place<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let session = session_token(&headers)?;

    let order = state
        .storefront
        .place_order(&identity, session, &req.selected_address)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: order.id.to_string(),
            message: "Thank you! Your order has been placed.".to_string(),
        }),
    ))
}

/// GET /orders — role-scoped, filtered, paginated order report.
#[tracing::instrument(skip(state, headers, query))]
pub async fn reports<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<Json<OrderReportResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;

    let mut filter = ReportFilter::new();
    if let Some(status_str) = &query.status {
        let status = OrderStatus::parse(status_str);
        if !status.is_recognized() {
            return Err(ApiError::BadRequest(format!(
                "Unrecognized status filter: {status_str}"
            )));
        }
        filter = filter.status(status);
    }
    if let Some(name) = &query.customer_name {
        filter = filter.customer_name(name.clone());
    }
    if let Some(from) = query.from_date {
        filter = filter.from_date(from);
    }
    if let Some(to) = query.to_date {
        filter = filter.to_date(to);
    }

    let page = state
        .storefront
        .order_reports(&identity, &filter, query.page, query.page_size)
        .await?;

    Ok(Json(OrderReportResponse {
        orders: page.orders.iter().map(order_to_response).collect(),
        page: page.page,
        total_pages: page.total_pages,
    }))
}

/// GET /orders/{id} — order details, soft-deleted rows included for audit.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.storefront.get_order(&identity, order_id).await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /orders/{id}/cancel — cancel a pending order.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderActionResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.storefront.cancel_order(&identity, order_id).await?;
    Ok(Json(OrderActionResponse {
        order_id: order.id.to_string(),
        status: order.status.to_string(),
        message: "Order has been cancelled.".to_string(),
    }))
}

/// POST /orders/{id}/approve — approve a pending order (admin).
#[tracing::instrument(skip(state, headers))]
pub async fn approve<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderActionResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.storefront.approve_order(&identity, order_id).await?;
    Ok(Json(OrderActionResponse {
        order_id: order.id.to_string(),
        status: order.status.to_string(),
        message: "Order approved.".to_string(),
    }))
}

/// POST /orders/{id}/status — admin status override with comment.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update_status<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderActionResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let order_id = parse_order_id(&id)?;

    let status = OrderStatus::parse(&req.status);
    let order = state
        .storefront
        .update_order_status(&identity, order_id, status, req.comment)
        .await?;

    Ok(Json(OrderActionResponse {
        order_id: order.id.to_string(),
        status: order.status.to_string(),
        message: format!("Order has been {}!", order.status.to_string().to_lowercase()),
    }))
}

/// POST /orders/{id}/delete — soft-delete a rejected/completed order (admin).
#[tracing::instrument(skip(state, headers))]
pub async fn delete<S: StorefrontStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderActionResponse>, ApiError> {
    let identity = resolve_identity(&state.sessions, &headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.storefront.delete_order(&identity, order_id).await?;
    Ok(Json(OrderActionResponse {
        order_id: order.id.to_string(),
        status: order.status.to_string(),
        message: "Order has been marked as deleted.".to_string(),
    }))
}
