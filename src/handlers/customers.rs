use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::customers::CreateCustomerCommand;
use crate::entities::lead;
use crate::services::customers::UpdateCustomerRequest;
use crate::{errors::ServiceError, AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Serialize)]
struct ConvertCustomerResponse {
    lead: lead::Model,
    success: bool,
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerCommand>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.customers.create_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (customers, total) = state
        .services
        .customers
        .list_customers(query.page, query.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(customers, total, &query)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.services.customers.get_customer(id).await?;
    Ok(Json(found))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.customers.update_customer(id, payload).await?;
    Ok(Json(updated))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reverse conversion: the customer becomes a fresh lead and is removed,
/// subject to the shared removal policy.
async fn convert_customer_to_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.customers.convert_to_lead(id).await?;
    Ok(Json(ConvertCustomerResponse {
        lead: result.lead,
        success: true,
    }))
}

async fn get_customer_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.customers.get_customer_orders(id).await?;
    Ok(Json(orders))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
        .route("/:id/convert-to-lead", post(convert_customer_to_lead))
        .route("/:id/orders", get(get_customer_orders))
}
