use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::orders::{CreateOrderRequest, UpdateOrderDetails};
use crate::{errors::ServiceError, AppState, ListQuery, PaginatedResponse};

/// Body for the status transition endpoints.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct StatusChangeRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    /// Appended to the order's notes audit trail when present.
    pub reason: Option<String>,
}

/// Create an order with line items; referenced products get their stock
/// decremented (clamped at zero).
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (orders, total) = state
        .services
        .orders
        .list_orders(query.page, query.limit, query.status.clone())
        .await?;
    Ok(Json(PaginatedResponse::new(orders, total, &query)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.orders.get_order(id).await?;
    Ok(Json(found))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderDetails>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.orders.update_order(id, payload).await?;
    Ok(Json(updated))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move an order to a new fulfillment status
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    let updated = state
        .services
        .orders
        .update_order_status(id, payload.status, payload.reason)
        .await?;
    Ok(Json(updated))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    let updated = state
        .services
        .orders
        .update_payment_status(id, payload.status, payload.reason)
        .await?;
    Ok(Json(updated))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route(
            "/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/:id/status", patch(update_order_status))
        .route("/:id/payment-status", patch(update_payment_status))
}
