//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// No session token, or the token resolved to nothing.
    Unauthenticated,
    /// Storefront logic error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Please sign in to continue".to_string(),
            ),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::EmptyCart | CheckoutError::InvalidAddress => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::Unauthorized => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Cart(cart_err) => match cart_err {
            CartError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
            // Advisory stock check: same contract as the checkout conflict.
            CartError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        },
        CheckoutError::Product(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Store(store_err) => store_error_to_response(store_err, &err),
        CheckoutError::Session(msg) => {
            tracing::error!(error = %msg, "session storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong".to_string(),
            )
        }
    }
}

fn store_error_to_response(store_err: &StoreError, err: &CheckoutError) -> (StatusCode, String) {
    match store_err {
        // Concurrent exhaustion and plain shortfall look the same to the
        // caller: retry with a smaller quantity.
        StoreError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        StoreError::ProductNotFound(_) | StoreError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        StoreError::Transition(order_err) => match order_err {
            OrderError::NotOwner => (StatusCode::FORBIDDEN, err.to_string()),
            // Illegal transitions surface as not-found, matching the
            // storefront's long-standing contract.
            OrderError::InvalidState { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            OrderError::UnrecognizedStatus { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %store_err, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
